use store_financials_csvs::Diagnostic;
use store_financials_testing::{dataset, FinancialRow, TestFixture};

/// Test duplicate key detection with a bounded sample
///
/// **Test flow:**
/// 1. Build 7 distinct keys, each appearing twice, plus one unique row
/// 2. Validate
/// 3. Verify every duplicated row is counted and the sample holds the first 5 distinct keys
#[test]
fn test_validation_duplicate_keys() {
    let test = TestFixture::new();

    // 1. Period spelled differently still collides after normalization
    let mut rows = Vec::new();
    for period in 1..=7 {
        rows.push(FinancialRow::new(2024, &format!("P{:02}", period), "Downtown"));
        rows.push(FinancialRow::new(2024, &period.to_string(), "Downtown"));
    }
    rows.push(FinancialRow::new(2024, "1", "Airport"));

    // 2. Validate
    let report = test.validate(&dataset(rows));

    // 3. 14 duplicated rows, 5 sampled keys
    assert!(!report.is_valid());
    let duplicates = report
        .diagnostics()
        .iter()
        .find_map(|d| match d {
            Diagnostic::DuplicateKeys { count, sample } => Some((*count, sample.clone())),
            _ => None,
        })
        .expect("duplicate diagnostic should be present");

    assert_eq!(duplicates.0, 14);
    assert_eq!(duplicates.1.len(), 5);
    assert_eq!(duplicates.1[0].to_string(), "(2024, 1, 'Downtown')");
    assert_eq!(duplicates.1[4].to_string(), "(2024, 5, 'Downtown')");

    let message = report
        .messages()
        .into_iter()
        .find(|m| m.starts_with("Found 14 duplicate rows"))
        .expect("duplicate message should be present");
    assert!(message.contains("YEAR, PERIOD, STORE_LOCATION"));
}

/// Same store in different periods is not a duplicate
#[test]
fn test_validation_distinct_keys_pass() {
    let test = TestFixture::new();
    let report = test.validate(&dataset(vec![
        FinancialRow::new(2024, "1", "Downtown"),
        FinancialRow::new(2024, "2", "Downtown"),
        FinancialRow::new(2025, "1", "Downtown"),
        FinancialRow::new(2024, "1", "Airport"),
    ]));

    assert!(report.is_valid(), "{:?}", report.messages());
}

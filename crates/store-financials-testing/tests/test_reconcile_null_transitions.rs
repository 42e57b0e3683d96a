use store_financials_csvs::{FinancialsSchema, NumericPolicy, ValidationRules};
use store_financials_testing::{dataset, first_run, second_run, FinancialRow, TestFixture};

/// Test that null to value and value to null both count as changes
///
/// **Test flow:**
/// 1. Load store A with RENT null and store B with RENT set
/// 2. Swap: A gets a RENT value, B's RENT becomes null
/// 3. Verify both rows are updated
/// 4. Resubmit the same data: null against null is not a change
#[test]
fn test_reconcile_null_transitions() {
    let mut test = TestFixture::new();

    // 1. Initial state
    test.reconcile(
        &dataset(vec![
            FinancialRow::new(2024, "1", "A").clear("RENT"),
            FinancialRow::new(2024, "1", "B").text("RENT", "2500"),
        ]),
        first_run(),
    )
    .unwrap();
    assert_eq!(test.row(2024, 1, "A").unwrap().decimal("RENT"), None);

    // 2. Swap nullness
    let swapped = dataset(vec![
        FinancialRow::new(2024, "1", "A").text("RENT", "2500"),
        FinancialRow::new(2024, "1", "B").clear("RENT"),
    ]);
    let outcome = test.reconcile(&swapped, second_run()).unwrap();

    // 3. Both changed
    assert_eq!((outcome.rows_inserted, outcome.rows_updated), (0, 2));
    assert_eq!(test.row(2024, 1, "B").unwrap().decimal("RENT"), None);
    assert_eq!(
        test.row(2024, 1, "A").unwrap().updated_at(),
        Some(second_run())
    );

    // 4. Null against null is stable
    let outcome = test.reconcile(&swapped, second_run()).unwrap();
    assert_eq!(outcome.rows_updated, 0);
}

/// Under the lenient policy a non-numeric amount is stored as null, so it is a change too
#[test]
fn test_reconcile_lenient_non_numeric_becomes_null() {
    let mut test = TestFixture::new();
    test.reconcile(
        &dataset(vec![FinancialRow::new(2024, "1", "A").text("WATER", "75")]),
        first_run(),
    )
    .unwrap();

    let outcome = test
        .reconcile(
            &dataset(vec![FinancialRow::new(2024, "1", "A").text("WATER", "n/a")]),
            second_run(),
        )
        .unwrap();

    assert_eq!(outcome.rows_updated, 1);
    assert_eq!(test.row(2024, 1, "A").unwrap().decimal("WATER"), None);
}

/// Under the strict policy the same value blocks the run
#[test]
fn test_strict_policy_rejects_non_numeric() {
    let rules = ValidationRules {
        numeric_policy: NumericPolicy::Strict,
        ..ValidationRules::default()
    };
    let test = TestFixture::with_schema(FinancialsSchema::with_rules(rules).unwrap());

    let report = test.validate(&dataset(vec![
        FinancialRow::new(2024, "1", "A").text("WATER", "n/a"),
        FinancialRow::new(2024, "2", "A").text("OPENED", "maybe"),
    ]));

    assert_eq!(
        report.messages(),
        vec![
            "Column WATER contains 1 non-numeric value(s)".to_string(),
            "Column OPENED contains 1 unrecognized flag value(s)".to_string(),
        ]
    );
}

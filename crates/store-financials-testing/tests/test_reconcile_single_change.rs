use rust_decimal::Decimal;
use std::str::FromStr;
use store_financials_testing::{dataset, first_run, second_run, FinancialRow, TestFixture};

fn rows(sales_for_b: &str) -> Vec<FinancialRow> {
    vec![
        FinancialRow::new(2024, "1", "A"),
        FinancialRow::new(2024, "1", "B").text("SALES", sales_for_b),
        FinancialRow::new(2024, "1", "C"),
    ]
}

/// Test that changing one financial column for one key updates exactly that row
///
/// **Test flow:**
/// 1. Reconcile three stores
/// 2. Change SALES for store B only and reconcile again at a later run start
/// 3. Verify one update; B keeps created_at and gets updated_at; A and C untouched
#[test]
fn test_reconcile_single_change() {
    let mut test = TestFixture::new();

    // 1. Initial load
    test.reconcile(&dataset(rows("100.00")), first_run()).unwrap();

    // 2. One value changes
    let outcome = test
        .reconcile(&dataset(rows("1250.75")), second_run())
        .unwrap();

    // 3. Exactly one update
    assert_eq!((outcome.rows_inserted, outcome.rows_updated), (0, 1));

    let b = test.row(2024, 1, "B").unwrap();
    assert_eq!(b.created_at(), Some(first_run()));
    assert_eq!(b.updated_at(), Some(second_run()));
    assert_eq!(b.decimal("SALES"), Some(Decimal::from_str("1250.75").unwrap()));

    for store in ["A", "C"] {
        let row = test.row(2024, 1, store).unwrap();
        assert_eq!(row.created_at(), Some(first_run()), "store {}", store);
        assert_eq!(row.updated_at(), None, "store {}", store);
    }
}

/// OPENED participates in change detection like a financial column
#[test]
fn test_reconcile_opened_change() {
    let mut test = TestFixture::new();
    test.reconcile(&dataset(vec![FinancialRow::new(2024, "1", "A")]), first_run())
        .unwrap();

    let outcome = test
        .reconcile(
            &dataset(vec![FinancialRow::new(2024, "1", "A").text("OPENED", "N")]),
            second_run(),
        )
        .unwrap();

    assert_eq!(outcome.rows_updated, 1);
    assert_eq!(test.row(2024, 1, "A").unwrap().integer("OPENED"), Some(0));
}

/// A new key alongside an unchanged one is an insert, not an update
#[test]
fn test_reconcile_mixed_insert_and_noop() {
    let mut test = TestFixture::new();
    test.reconcile(&dataset(vec![FinancialRow::new(2024, "1", "A")]), first_run())
        .unwrap();

    let outcome = test
        .reconcile(
            &dataset(vec![
                FinancialRow::new(2024, "1", "A"),
                FinancialRow::new(2024, "2", "A"),
            ]),
            second_run(),
        )
        .unwrap();

    assert_eq!((outcome.rows_inserted, outcome.rows_updated), (1, 0));
    assert_eq!(test.row(2024, 2, "A").unwrap().created_at(), Some(second_run()));
}

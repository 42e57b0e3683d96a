//! Warehouse-side view of the financials schema.

use store_financials_csvs::schemas::{
    OPENED_COLUMN, PERIOD_COLUMN, STORE_LOCATION_COLUMN, YEAR_COLUMN,
};
use store_financials_csvs::{FinancialsSchema, KeyTuple};
use store_financials_db::{ColumnDef, ColumnKind, DbResult, MergeSpec, TableLayout, Value};

/// Target table columns in required-column order, keyed on the merge key
pub fn table_layout(schema: &FinancialsSchema) -> DbResult<TableLayout> {
    let columns = schema
        .required_columns()
        .iter()
        .map(|name| {
            let kind = match name.as_str() {
                YEAR_COLUMN | PERIOD_COLUMN | OPENED_COLUMN => ColumnKind::Integer,
                STORE_LOCATION_COLUMN => ColumnKind::Text,
                _ => ColumnKind::Decimal,
            };
            ColumnDef::new(name.clone(), kind)
        })
        .collect();

    TableLayout::new(columns, schema.key_columns().to_vec())
}

/// Join on the key, compare and update every financial column plus OPENED
pub fn merge_spec(schema: &FinancialsSchema) -> DbResult<MergeSpec> {
    MergeSpec::new(
        schema.key_columns().to_vec(),
        schema.change_columns(),
        schema.required_columns().to_vec(),
    )
}

/// Column/value pairs that locate one key in the target table
pub fn key_values(key: &KeyTuple) -> Vec<(&'static str, Value)> {
    vec![
        (YEAR_COLUMN, Value::Integer(i64::from(key.year))),
        (PERIOD_COLUMN, Value::Integer(i64::from(key.period))),
        (STORE_LOCATION_COLUMN, Value::Text(key.store_location.clone())),
    ]
}

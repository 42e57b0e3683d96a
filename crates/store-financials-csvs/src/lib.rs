/*!
# Store Financials Schema & Validation

This crate provides the **authoritative schema** for the periodic store financials
spreadsheet and the validation pass that guards the warehouse load.

## Purpose

This crate serves as the **single source of truth** for the data contract between:

- **Operators** (producers) → Export one row per store/year/period from the finance workbook
- **`load`** (consumer) → Validates, stages and merges the rows into the warehouse
- **`validate`** (consumer) → Checks a file without touching the warehouse

## Input Files

Both spreadsheets (`.xlsx`, `.xlsm`, `.xls`, `.ods`) and `.csv` exports are accepted.
Header names are trimmed and upper-cased before validation, so `Store_Location ` and
`STORE_LOCATION` are the same column. Extra columns are ignored.

## Usage

```rust,no_run
use store_financials_csvs::{read_dataset, validate, CsvResult, FinancialsSchema};

fn example() -> CsvResult<()> {
    let schema = FinancialsSchema::standard();
    let dataset = read_dataset("financials.xlsx")?;

    let report = validate(&dataset, &schema);
    for message in report.messages() {
        eprintln!("{}", message);
    }

    let batch = report.into_batch()?;
    println!("{} rows ready to load", batch.len());
    Ok(())
}
```
*/

pub mod coercion;
pub mod dataset;
pub mod errors;
pub mod records;
pub mod schemas;
pub mod summary;
pub mod validation;

// Re-export main types for convenience
pub use dataset::{normalize_column_name, read_dataset, Cell, Dataset};
pub use errors::{CsvError, CsvResult};
pub use records::{write_batch_csv, Batch, FinancialRecord, KeyTuple};
pub use schemas::{FinancialsSchema, NumericPolicy, ValidationRules, REQUIRED_COLUMNS};
pub use summary::ValidationSummary;
pub use validation::{validate, Diagnostic, KeySample, ValidationReport};

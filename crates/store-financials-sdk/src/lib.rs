/*!
# Store Financials SDK

Validate-then-reconcile pipeline for store financials.

```rust,no_run
use std::path::Path;
use store_financials_csvs::FinancialsSchema;
use store_financials_db::{SqliteWarehouse, TableNames, WarehouseConfig};
use store_financials_sdk::run_pipeline;

let config = WarehouseConfig {
    db_path: "warehouse.db".into(),
    stage_dir: "stage".into(),
    tables: TableNames::new(
        "RAW_STORE_FINANCIALS",
        "RAW_STORE_FINANCIALS_TEMP",
        "FINANCIALS_STAGE",
    )?,
};
let schema = FinancialsSchema::standard();
let report = run_pipeline(Path::new("financials.xlsx"), &schema, || {
    SqliteWarehouse::open(&config)
})?;
println!("{}", report);
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

mod layout;
mod pipeline;
mod pipeline_error;
mod reconciler;

pub use layout::{key_values, merge_spec, table_layout};
pub use pipeline::{run_pipeline, validate_file, RunReport, ValidatedFile};
pub use pipeline_error::{PipelineError, PipelineResult};
pub use reconciler::{stage_file_name, ReconcileOutcome, Reconciler};

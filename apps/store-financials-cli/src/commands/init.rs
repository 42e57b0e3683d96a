use crate::config::AppConfig;
use crate::error::CliResult;
use std::fs;
use store_financials_csvs::FinancialsSchema;
use store_financials_db::SqliteWarehouse;
use store_financials_sdk::table_layout;

pub fn execute(config: &AppConfig, schema: &FinancialsSchema) -> CliResult<()> {
    let warehouse_config = config.warehouse_config()?;

    if let Some(parent) = warehouse_config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    println!("Database: {}", warehouse_config.db_path.display());
    let warehouse = SqliteWarehouse::open(&warehouse_config)?;
    let layout = table_layout(schema)?;

    let target = &warehouse_config.tables.target;
    if warehouse.ensure_target_table(&layout)? {
        println!(
            "Created table {} with {} columns",
            target,
            layout.columns().len() + 2
        );
    } else {
        println!("Table {} already exists", target);
    }

    Ok(())
}

use crate::config::AppConfig;
use crate::error::CliResult;
use store_financials_db::SqliteWarehouse;

pub fn execute(config: &AppConfig) -> CliResult<()> {
    let warehouse_config = config.warehouse_config()?;
    println!("Testing warehouse connection...");
    println!("Database: {}", warehouse_config.db_path.display());
    println!("Stage directory: {}", warehouse_config.stage_dir.display());

    let warehouse = SqliteWarehouse::open(&warehouse_config)?;
    let version = warehouse.ping()?;
    println!("Connected successfully (SQLite {})", version);

    let target = &warehouse_config.tables.target;
    if warehouse.target_exists()? {
        println!("Table {} exists", target);
        println!("Current row count: {}", warehouse.row_count()?);
    } else {
        println!("Table {} does not exist yet", target);
        println!("Run `store-financials init` to create it");
    }

    warehouse.close()?;
    Ok(())
}

use crate::config::AppConfig;
use crate::error::CliResult;
use std::path::{Path, PathBuf};
use store_financials_csvs::FinancialsSchema;
use store_financials_db::SqliteWarehouse;
use store_financials_sdk::{run_pipeline, RunReport};

pub fn execute(
    config: &AppConfig,
    schema: &FinancialsSchema,
    file: PathBuf,
    log_path: Option<&Path>,
) -> CliResult<()> {
    let warehouse_config = config.warehouse_config()?;
    println!("Database: {}", warehouse_config.db_path.display());
    println!("Target table: {}", warehouse_config.tables.target);

    let report = run_pipeline(&file, schema, || SqliteWarehouse::open(&warehouse_config))?;

    println!();
    println!("{}", operator_output(&report, log_path));
    Ok(())
}

/// Validation summary, run report and log location, printed regardless of the log filter
fn operator_output(report: &RunReport, log_path: Option<&Path>) -> String {
    let mut out = format!("{}\n\n{}", report.summary, report);
    if let Some(path) = log_path {
        out.push_str(&format!("\nLog file: {}", path.display()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;
    use store_financials_csvs::{Batch, ValidationSummary};
    use store_financials_sdk::ReconcileOutcome;

    fn report() -> RunReport {
        RunReport {
            source: PathBuf::from("financials.xlsx"),
            started_at: Utc::now(),
            duration: Duration::from_secs(2),
            summary: ValidationSummary::from_batch(
                &Batch::default(),
                &FinancialsSchema::standard(),
            ),
            outcome: ReconcileOutcome {
                rows_loaded: 2,
                rows_inserted: 2,
                rows_updated: 0,
            },
        }
    }

    #[test]
    fn test_output_includes_validation_summary() {
        let text = operator_output(&report(), Some(Path::new("logs/load_financials_x.log")));

        assert!(text.contains("DATA VALIDATION SUMMARY"));
        assert!(text.contains("PIPELINE COMPLETED SUCCESSFULLY!"));
        assert!(text.ends_with("Log file: logs/load_financials_x.log"));
    }

    #[test]
    fn test_output_without_log_file() {
        let text = operator_output(&report(), None);
        assert!(text.contains("Total Rows: 0"));
        assert!(!text.contains("Log file"));
    }
}

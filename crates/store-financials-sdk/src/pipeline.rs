/*!
# Pipeline

End-to-end run: read the input file, validate it, and only if it is clean open the
warehouse and reconcile. Validation failures never touch the warehouse.
*/

use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::{PipelineError, PipelineResult};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use store_financials_csvs::{
    read_dataset, validate, Batch, CsvError, FinancialsSchema, ValidationSummary,
};
use store_financials_db::{DbResult, Warehouse};
use tracing::{error, info};

/// A validated input file
#[derive(Debug, Clone)]
pub struct ValidatedFile {
    pub path: PathBuf,
    pub batch: Batch,
    pub summary: ValidationSummary,
}

/// Outcome of a successful pipeline run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub source: PathBuf,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub summary: ValidationSummary,
    pub outcome: ReconcileOutcome,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "PIPELINE COMPLETED SUCCESSFULLY!")?;
        writeln!(f, "Input file: {}", self.source.display())?;
        writeln!(f, "Rows loaded: {}", self.outcome.rows_loaded)?;
        writeln!(f, "Rows inserted: {}", self.outcome.rows_inserted)?;
        writeln!(f, "Rows updated: {}", self.outcome.rows_updated)?;
        writeln!(f, "Duration: {:.2} seconds", self.duration.as_secs_f64())?;
        write!(f, "{}", rule)
    }
}

fn source_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Steps 1 and 2: read and validate, logging every diagnostic on failure
pub fn validate_file(path: &Path, schema: &FinancialsSchema) -> PipelineResult<ValidatedFile> {
    info!(file = %path.display(), "Step 1: Reading input file...");
    let dataset = read_dataset(path)?;
    info!(rows = dataset.len(), "Loaded {} rows from input file", dataset.len());

    info!("Step 2: Validating data...");
    let report = validate(&dataset, schema);
    let batch = report.into_batch().map_err(|e| match e {
        CsvError::ValidationFailed(messages) => {
            error!("VALIDATION FAILED!");
            for message in &messages {
                error!("  - {}", message);
            }
            PipelineError::Validation(messages)
        }
        other => other.into(),
    })?;

    info!(rows = batch.len(), "Validation passed");
    let summary = ValidationSummary::from_batch(&batch, schema);

    Ok(ValidatedFile {
        path: path.to_path_buf(),
        batch,
        summary,
    })
}

/// Validate `path`, then connect and reconcile it into the warehouse
///
/// `connect` is only called once validation has passed. The warehouse it returns is owned
/// by this call and dropped before returning, on success and on failure.
pub fn run_pipeline<W, F>(
    path: &Path,
    schema: &FinancialsSchema,
    connect: F,
) -> PipelineResult<RunReport>
where
    W: Warehouse,
    F: FnOnce() -> DbResult<W>,
{
    let started_at = Utc::now();
    let clock = Instant::now();

    info!("{}", "=".repeat(60));
    info!("STORE FINANCIALS PIPELINE STARTED");
    info!("Input file: {}", path.display());
    info!("{}", "=".repeat(60));

    let validated = validate_file(path, schema)?;
    info!("Validation summary:\n{}", validated.summary);

    info!("Step 3: Connecting to warehouse...");
    let mut warehouse = connect()?;
    let result = Reconciler::new(&mut warehouse, schema).reconcile_at(
        &validated.batch,
        &source_label(path),
        started_at,
    );
    drop(warehouse);
    info!("Closed warehouse connection");

    let outcome = result?;
    let report = RunReport {
        source: validated.path,
        started_at,
        duration: clock.elapsed(),
        summary: validated.summary,
        outcome,
    };

    info!("{}", "=".repeat(60));
    info!("PIPELINE COMPLETED SUCCESSFULLY!");
    info!(
        inserted = report.outcome.rows_inserted,
        updated = report.outcome.rows_updated,
        duration_secs = report.duration.as_secs_f64(),
        "Rows inserted: {}, rows updated: {}",
        report.outcome.rows_inserted,
        report.outcome.rows_updated
    );
    info!("{}", "=".repeat(60));

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use store_financials_db::{DbError, SqliteWarehouse};

    fn csv_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{}", body).unwrap();
        file
    }

    #[test]
    fn test_source_label_is_file_name() {
        assert_eq!(source_label(Path::new("/data/in/financials.xlsx")), "financials.xlsx");
    }

    #[test]
    fn test_validate_file_reports_missing_columns() {
        let file = csv_file("YEAR,PERIOD\n2024,P1\n");
        let err = validate_file(file.path(), &FinancialsSchema::standard()).unwrap_err();

        let diagnostics = err.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].starts_with("Missing required columns: OPENED, STORE_LOCATION"));
    }

    #[test]
    fn test_validate_file_missing_path() {
        let schema = FinancialsSchema::standard();
        let err = validate_file(Path::new("nope.xlsx"), &schema).unwrap_err();
        assert!(matches!(err, PipelineError::Csv(CsvError::FileNotFound(_))));
        assert!(err.diagnostics().is_empty());
    }

    #[test]
    fn test_invalid_file_never_connects() {
        let file = csv_file("YEAR\n2024\n");
        let mut connected = false;

        let result = run_pipeline(file.path(), &FinancialsSchema::standard(), || {
            connected = true;
            Err::<SqliteWarehouse, _>(DbError::Connection("unreachable".into()))
        });

        assert!(matches!(result, Err(PipelineError::Validation(_))));
        assert!(!connected);
    }

    #[test]
    fn test_run_report_display() {
        let report = RunReport {
            source: PathBuf::from("financials.xlsx"),
            started_at: Utc::now(),
            duration: Duration::from_millis(1500),
            summary: ValidationSummary::from_batch(
                &Batch::default(),
                &FinancialsSchema::standard(),
            ),
            outcome: ReconcileOutcome {
                rows_loaded: 4,
                rows_inserted: 3,
                rows_updated: 1,
            },
        };

        let text = report.to_string();
        assert!(text.contains("Rows inserted: 3"));
        assert!(text.contains("Rows updated: 1"));
        assert!(text.contains("Duration: 1.50 seconds"));
    }
}

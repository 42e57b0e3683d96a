/*!
# Reconciler

Moves a validated [`Batch`] into the warehouse: write it to a local CSV, upload it to the
stage, reset the holding table, bulk-load it, and merge the holding table into the target.

The local CSV is a [`NamedTempFile`], so it is removed whether or not the run succeeds.
*/

use crate::layout::merge_spec;
use crate::{PipelineError, PipelineResult};
use chrono::{DateTime, Utc};
use std::fmt;
use store_financials_csvs::{write_batch_csv, Batch, FinancialsSchema};
use store_financials_db::Warehouse;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Row counts for one reconcile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOutcome {
    pub rows_loaded: u64,
    pub rows_inserted: u64,
    pub rows_updated: u64,
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loaded {}, inserted {}, updated {}",
            self.rows_loaded, self.rows_inserted, self.rows_updated
        )
    }
}

/// Staged file name for a run started at `started`
pub fn stage_file_name(started: DateTime<Utc>) -> String {
    format!("financials_{}.csv", started.format("%Y%m%d_%H%M%S"))
}

pub struct Reconciler<'a, W: Warehouse> {
    warehouse: &'a mut W,
    schema: &'a FinancialsSchema,
}

impl<'a, W: Warehouse> Reconciler<'a, W> {
    pub fn new(warehouse: &'a mut W, schema: &'a FinancialsSchema) -> Self {
        Self { warehouse, schema }
    }

    /// Reconcile a batch, stamping rows with the current time
    pub fn reconcile(
        &mut self,
        batch: &Batch,
        source_label: &str,
    ) -> PipelineResult<ReconcileOutcome> {
        self.reconcile_at(batch, source_label, Utc::now())
    }

    /// Reconcile a batch, stamping inserted and updated rows with `load_timestamp`
    pub fn reconcile_at(
        &mut self,
        batch: &Batch,
        source_label: &str,
        load_timestamp: DateTime<Utc>,
    ) -> PipelineResult<ReconcileOutcome> {
        let spec = merge_spec(self.schema)?;

        info!("Step 4: Setting up warehouse stage...");
        self.warehouse.ensure_stage()?;

        info!("Step 5: Uploading data to stage...");
        let local = tempfile::Builder::new()
            .prefix("temp_financials_")
            .suffix(".csv")
            .tempfile()?;
        write_batch_csv(local.as_file(), self.schema, batch)?;
        debug!(path = %local.path().display(), rows = batch.len(), "wrote local staging file");

        let staged = self
            .warehouse
            .upload(local.path(), &stage_file_name(load_timestamp))?;

        info!("Step 6: Creating holding table...");
        self.warehouse.reset_holding_table()?;

        info!("Step 7: Loading data to holding table...");
        let rows_loaded = self
            .warehouse
            .load(&staged, self.schema.required_columns())?;
        if rows_loaded != batch.len() as u64 {
            return Err(PipelineError::RowCountMismatch {
                loaded: rows_loaded,
                expected: batch.len(),
            });
        }

        info!("Step 8: Merging data to target table...");
        let counts = self.warehouse.merge(&spec, load_timestamp)?;
        if let Err(e) = self.warehouse.remove_staged(&staged) {
            warn!(stage_file = %staged, error = %e, "Failed to remove staged file");
        }

        let outcome = ReconcileOutcome {
            rows_loaded,
            rows_inserted: counts.rows_inserted,
            rows_updated: counts.rows_updated,
        };
        info!(
            source = source_label,
            target = %self.warehouse.table_names().target,
            stage_file = %staged,
            rows = outcome.rows_loaded,
            inserted = outcome.rows_inserted,
            updated = outcome.rows_updated,
            "Reconciled batch"
        );

        remove_local_file(local);
        Ok(outcome)
    }
}

fn remove_local_file(local: NamedTempFile) {
    let path = local.path().to_path_buf();
    match local.close() {
        Ok(()) => debug!(path = %path.display(), "Cleaned up temporary file"),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove temporary file"),
    }
}

// ================================================================================================
// Tests
// ================================================================================================

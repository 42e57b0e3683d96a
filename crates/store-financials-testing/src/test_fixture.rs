use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use store_financials_csvs::{
    validate, Batch, Dataset, FinancialsSchema, KeyTuple, ValidationReport,
};
use store_financials_db::{SqliteWarehouse, StoredRow, TableNames, WarehouseConfig};
use store_financials_sdk::{
    key_values, table_layout, PipelineResult, ReconcileOutcome, Reconciler,
};
use tempfile::TempDir;

use crate::write_dataset_csv;

/// A file-backed SQLite warehouse with an initialized target table, living in a temp dir
pub struct TestFixture {
    pub schema: FinancialsSchema,
    pub warehouse: SqliteWarehouse,
    config: WarehouseConfig,
    dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_schema(FinancialsSchema::standard())
    }

    pub fn with_schema(schema: FinancialsSchema) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = WarehouseConfig {
            db_path: dir.path().join("warehouse.db"),
            stage_dir: dir.path().join("stage"),
            tables: TableNames::new(
                "RAW_STORE_FINANCIALS_TEST",
                "RAW_STORE_FINANCIALS_TEST_TEMP",
                "FINANCIALS_STAGE_TEST",
            )
            .expect("Test table names are valid"),
        };

        let warehouse = SqliteWarehouse::open(&config).expect("Failed to open warehouse");
        let layout = table_layout(&schema).expect("Schema maps to a table layout");
        warehouse
            .ensure_target_table(&layout)
            .expect("Failed to create target table");

        Self {
            schema,
            warehouse,
            config,
            dir,
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Open a second connection to the same warehouse, as a pipeline run would
    pub fn connect(&self) -> SqliteWarehouse {
        SqliteWarehouse::open(&self.config).expect("Failed to reopen warehouse")
    }

    pub fn validate(&self, dataset: &Dataset) -> ValidationReport {
        validate(dataset, &self.schema)
    }

    /// Validate and unwrap the batch; panics with the diagnostics if invalid
    pub fn batch(&self, dataset: &Dataset) -> Batch {
        let report = self.validate(dataset);
        assert!(report.is_valid(), "dataset should be valid: {:?}", report.messages());
        report.into_batch().expect("valid report converts to a batch")
    }

    /// Validate then reconcile a dataset with a fixed run start
    pub fn reconcile(
        &mut self,
        dataset: &Dataset,
        at: DateTime<Utc>,
    ) -> PipelineResult<ReconcileOutcome> {
        let batch = self.batch(dataset);
        Reconciler::new(&mut self.warehouse, &self.schema).reconcile_at(&batch, "fixture", at)
    }

    pub fn row(&self, year: i32, period: u32, store_location: &str) -> Option<StoredRow> {
        let key = KeyTuple::new(year, period, store_location);
        self.warehouse
            .find_row(&key_values(&key))
            .expect("Failed to query target table")
    }

    pub fn row_count(&self) -> u64 {
        self.warehouse.row_count().expect("Failed to count rows")
    }

    /// Write a dataset as a CSV input file inside the fixture dir
    pub fn write_input(&self, name: &str, dataset: &Dataset) -> PathBuf {
        let path = self.dir.path().join(name);
        write_dataset_csv(&path, dataset).expect("Failed to write input file");
        path
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

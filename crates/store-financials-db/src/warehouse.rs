use crate::merge::MergeSpec;
use crate::schema::validate_identifier;
use crate::DbResult;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};

/// Names of the tables and stage one pipeline run works against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub target: String,
    pub holding: String,
    pub stage: String,
}

impl TableNames {
    pub fn new(
        target: impl Into<String>,
        holding: impl Into<String>,
        stage: impl Into<String>,
    ) -> DbResult<Self> {
        let names = Self {
            target: target.into(),
            holding: holding.into(),
            stage: stage.into(),
        };
        validate_identifier(&names.target)?;
        validate_identifier(&names.holding)?;
        validate_identifier(&names.stage)?;
        Ok(names)
    }
}

/// A file that has been placed in the warehouse stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub stage: String,
    pub file_name: String,
    pub path: PathBuf,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for StagedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}/{}", self.stage, self.file_name)
    }
}

/// Row counts reported by one merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeCounts {
    pub rows_inserted: u64,
    pub rows_updated: u64,
}

/// Warehouse operations the reconciler drives
///
/// Every call is a blocking round trip; the reconciler issues them strictly in order.
pub trait Warehouse {
    /// Make sure the named stage exists
    fn ensure_stage(&mut self) -> DbResult<()>;

    /// Copy a local file into the stage, replacing any file with the same name
    fn upload(&mut self, local_file: &Path, file_name: &str) -> DbResult<StagedFile>;

    /// Drop and recreate the session-scoped holding table from the target's shape
    fn reset_holding_table(&mut self) -> DbResult<()>;

    /// Bulk-load a staged file into the holding table; any bad row aborts the whole load
    fn load(&mut self, staged: &StagedFile, columns: &[String]) -> DbResult<u64>;

    /// Reconcile the holding table into the target as one atomic statement
    fn merge(&mut self, spec: &MergeSpec, load_timestamp: DateTime<Utc>) -> DbResult<MergeCounts>;

    /// Delete a staged file once its rows have been merged
    fn remove_staged(&mut self, staged: &StagedFile) -> DbResult<()>;

    /// Tables this warehouse session is bound to
    fn table_names(&self) -> &TableNames;
}

use store_financials_csvs::CsvError;
use store_financials_db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Validation failed with {} problem(s)", .0.len())]
    Validation(Vec<String>),

    #[error("Loaded {loaded} rows into the holding table but the batch has {expected}")]
    RowCountMismatch { loaded: u64, expected: usize },
}

impl PipelineError {
    /// Diagnostics behind a validation failure, empty for every other error
    pub fn diagnostics(&self) -> &[String] {
        match self {
            PipelineError::Validation(messages) => messages,
            _ => &[],
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

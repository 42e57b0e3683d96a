use store_financials_csvs::CsvError;
use store_financials_db::DbError;
use store_financials_sdk::PipelineError;
use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

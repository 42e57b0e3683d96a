use crate::error::{CliError, CliResult};
use std::fs;
use std::path::{Path, PathBuf};
use store_financials_csvs::{FinancialsSchema, ValidationRules};
use store_financials_db::{TableNames, WarehouseConfig};

pub const DB_PATH_VAR: &str = "FINANCIALS_DB_PATH";
pub const STAGE_DIR_VAR: &str = "FINANCIALS_STAGE_DIR";
pub const TARGET_TABLE_VAR: &str = "FINANCIALS_TARGET_TABLE";
pub const TEMP_TABLE_VAR: &str = "FINANCIALS_TEMP_TABLE";
pub const STAGE_NAME_VAR: &str = "FINANCIALS_STAGE_NAME";

const DEFAULT_STAGE_DIR: &str = "stage";
const DEFAULT_TARGET_TABLE: &str = "RAW_STORE_FINANCIALS";
const DEFAULT_TEMP_TABLE: &str = "RAW_STORE_FINANCIALS_TEMP";
const DEFAULT_STAGE_NAME: &str = "FINANCIALS_STAGE";

const SANDBOX_TARGET_TABLE: &str = "RAW_STORE_FINANCIALS_TEST";
const SANDBOX_TEMP_TABLE: &str = "RAW_STORE_FINANCIALS_TEST_TEMP";
const SANDBOX_STAGE_NAME: &str = "FINANCIALS_STAGE_TEST";

/// Warehouse settings resolved from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: Option<PathBuf>,
    pub stage_dir: PathBuf,
    pub target_table: String,
    pub temp_table: String,
    pub stage_name: String,
}

impl AppConfig {
    /// Read settings from the process environment (after `.env` has been loaded)
    pub fn from_env(sandbox: bool) -> Self {
        Self::from_lookup(sandbox, |key| std::env::var(key).ok())
    }

    /// Resolve settings through `lookup`; sandbox mode pins the test objects
    pub fn from_lookup<F>(sandbox: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let (target_table, temp_table, stage_name) = if sandbox {
            (
                SANDBOX_TARGET_TABLE.to_string(),
                SANDBOX_TEMP_TABLE.to_string(),
                SANDBOX_STAGE_NAME.to_string(),
            )
        } else {
            (
                value(TARGET_TABLE_VAR, DEFAULT_TARGET_TABLE),
                value(TEMP_TABLE_VAR, DEFAULT_TEMP_TABLE),
                value(STAGE_NAME_VAR, DEFAULT_STAGE_NAME),
            )
        };

        Self {
            db_path: lookup(DB_PATH_VAR)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            stage_dir: PathBuf::from(value(STAGE_DIR_VAR, DEFAULT_STAGE_DIR)),
            target_table,
            temp_table,
            stage_name,
        }
    }

    pub fn warehouse_config(&self) -> CliResult<WarehouseConfig> {
        let db_path = self.db_path.clone().ok_or_else(|| {
            CliError::InvalidConfig(format!("{} is not set", DB_PATH_VAR))
        })?;
        let tables = TableNames::new(&self.target_table, &self.temp_table, &self.stage_name)?;

        Ok(WarehouseConfig {
            db_path,
            stage_dir: self.stage_dir.clone(),
            tables,
        })
    }
}

/// Build the schema, applying rule overrides from a YAML file when given
pub fn load_schema(rules_path: Option<&Path>) -> CliResult<FinancialsSchema> {
    let Some(path) = rules_path else {
        return Ok(FinancialsSchema::standard());
    };

    if !path.exists() {
        return Err(CliError::InvalidConfig(format!(
            "Rules file not found: {}",
            path.display()
        )));
    }

    let text = fs::read_to_string(path)?;
    let rules: ValidationRules = serde_yaml::from_str(&text)?;
    Ok(FinancialsSchema::with_rules(rules)?)
}

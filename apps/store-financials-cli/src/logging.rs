use crate::error::{CliError, CliResult};
use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_DIR: &str = "logs";

pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("load_financials_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Install the global subscriber: stdout always, plus a per-run file under `log_dir`
///
/// `RUST_LOG` overrides the default `info` filter. Returns the log file path when one was
/// created.
pub fn init_logging(log_dir: Option<&Path>) -> CliResult<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, log_path) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let path = dir.join(log_file_name(Local::now()));
            let file = File::create(&path)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Arc::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;

    Ok(log_path)
}

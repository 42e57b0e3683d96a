use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;

mod commands;
mod config;
mod error;
mod logging;

use config::{load_schema, AppConfig};
use error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "store-financials")]
#[command(about = "Validate store financials spreadsheets and reconcile them into the warehouse")]
#[command(version)]
struct Cli {
    /// Work against the test tables and stage instead of production
    #[arg(long, global = true)]
    sandbox: bool,

    /// YAML file overriding validation rules (year/period bounds, numeric policy)
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a file, then stage, load and merge it into the target table
    Load {
        /// Input spreadsheet (.xlsx, .xls, .ods) or CSV export
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Validate a file without touching the warehouse
    Validate {
        /// Input spreadsheet (.xlsx, .xls, .ods) or CSV export
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Create the target table if it does not exist
    Init,

    /// Check warehouse connectivity and report the target table's row count
    CheckConnection,
}

fn main() -> ExitCode {
    // .env is optional
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let log_dir = matches!(cli.command, Commands::Load { .. }).then(|| Path::new(logging::LOG_DIR));
    let log_path = match logging::init_logging(log_dir) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli, log_path.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(&e, log_path.as_deref());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, log_path: Option<&Path>) -> CliResult<()> {
    let config = AppConfig::from_env(cli.sandbox);
    let schema = load_schema(cli.rules.as_deref())?;

    match cli.command {
        Commands::Load { file } => commands::load::execute(&config, &schema, file, log_path),
        Commands::Validate { file } => commands::validate::execute(&schema, file),
        Commands::Init => commands::init::execute(&config, &schema),
        Commands::CheckConnection => commands::check_connection::execute(&config),
    }
}

fn report_failure(err: &CliError, log_path: Option<&Path>) {
    error!("Run failed: {}", err);

    eprintln!();
    eprintln!("Error: {}", err);
    if let CliError::Pipeline(pipeline_err) = err {
        for message in pipeline_err.diagnostics() {
            eprintln!("  - {}", message);
        }
    }
    if let Some(path) = log_path {
        eprintln!("Check the log file for details: {}", path.display());
    }
}

use crate::error::CliResult;
use std::path::PathBuf;
use store_financials_csvs::FinancialsSchema;
use store_financials_sdk::validate_file;

pub fn execute(schema: &FinancialsSchema, file: PathBuf) -> CliResult<()> {
    println!("Validating {}", file.display());
    println!(
        "Years {}-{}, periods {}-{}",
        schema.rules().min_year,
        schema.rules().max_year,
        schema.rules().min_period,
        schema.rules().max_period
    );

    let validated = validate_file(&file, schema)?;

    println!("{}", validated.summary);
    println!("{} rows are ready to load", validated.batch.len());
    Ok(())
}

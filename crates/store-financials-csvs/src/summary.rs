use crate::records::Batch;
use crate::schemas::FinancialsSchema;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::fmt;

const SAMPLE_ROWS: usize = 5;

/// Overview of a validated batch, printed before the warehouse load starts
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationSummary {
    pub total_rows: usize,
    pub unique_stores: usize,
    pub year_range: Option<(i32, i32)>,
    pub period_range: Option<(u32, u32)>,
    pub sample: Vec<SampleRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub year: i32,
    pub period: u32,
    pub store_location: String,
    pub sales: Option<Decimal>,
    pub cogs: Option<Decimal>,
}

impl ValidationSummary {
    pub fn from_batch(batch: &Batch, schema: &FinancialsSchema) -> Self {
        let stores: HashSet<&str> = batch
            .iter()
            .map(|r| r.key.store_location.as_str())
            .collect();

        let years = batch.iter().map(|r| r.key.year);
        let year_range = years.clone().min().zip(years.max());
        let periods = batch.iter().map(|r| r.key.period);
        let period_range = periods.clone().min().zip(periods.max());

        let sample = batch
            .iter()
            .take(SAMPLE_ROWS)
            .map(|r| SampleRow {
                year: r.key.year,
                period: r.key.period,
                store_location: r.key.store_location.clone(),
                sales: r.financial(schema, "SALES"),
                cogs: r.financial(schema, "COGS"),
            })
            .collect();

        Self {
            total_rows: batch.len(),
            unique_stores: stores.len(),
            year_range,
            period_range,
            sample,
        }
    }
}

fn range_text<T: fmt::Display>(range: &Option<(T, T)>) -> String {
    match range {
        Some((min, max)) => format!("{} - {}", min, max),
        None => "n/a".to_string(),
    }
}

fn amount_text(value: &Option<Decimal>) -> String {
    value.map_or_else(|| "null".to_string(), |d| d.to_string())
}

impl fmt::Display for ValidationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "DATA VALIDATION SUMMARY")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Total Rows: {}", self.total_rows)?;
        writeln!(f, "Unique Stores: {}", self.unique_stores)?;
        writeln!(f, "Year Range: {}", range_text(&self.year_range))?;
        writeln!(f, "Period Range: {}", range_text(&self.period_range))?;
        writeln!(f)?;
        writeln!(f, "Sample of data:")?;
        writeln!(
            f,
            "{:>6} {:>6}  {:<24} {:>14} {:>14}",
            "YEAR", "PERIOD", "STORE_LOCATION", "SALES", "COGS"
        )?;
        for row in &self.sample {
            writeln!(
                f,
                "{:>6} {:>6}  {:<24} {:>14} {:>14}",
                row.year,
                row.period,
                row.store_location,
                amount_text(&row.sales),
                amount_text(&row.cogs)
            )?;
        }
        write!(f, "{}", rule)
    }
}

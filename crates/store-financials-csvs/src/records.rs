/*!
# Validated Records

Typed rows produced by a successful validation pass, and the writer that renders a
[`Batch`] into the staged file format: header-bearing, row-delimited CSV in schema
column order, with non-numeric fields quoted. Blank fields are nulls.
*/

use crate::errors::CsvResult;
use crate::schemas::{
    FinancialsSchema, OPENED_COLUMN, PERIOD_COLUMN, STORE_LOCATION_COLUMN, YEAR_COLUMN,
};
use csv::{QuoteStyle, WriterBuilder};
use rust_decimal::Decimal;
use std::fmt;
use std::io::Write;

/// Merge key of one record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyTuple {
    pub year: i32,
    pub period: u32,
    pub store_location: String,
}

impl KeyTuple {
    pub fn new(year: i32, period: u32, store_location: impl Into<String>) -> Self {
        Self {
            year,
            period,
            store_location: store_location.into(),
        }
    }
}

impl fmt::Display for KeyTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, '{}')", self.year, self.period, self.store_location)
    }
}

/// One store/year/period observation with normalized values
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialRecord {
    pub key: KeyTuple,
    pub opened: Option<bool>,
    /// Aligned with [`FinancialsSchema::financial_columns`]
    pub financials: Vec<Option<Decimal>>,
}

impl FinancialRecord {
    /// Value of a financial column by name
    pub fn financial(&self, schema: &FinancialsSchema, column: &str) -> Option<Decimal> {
        schema
            .financial_index(column)
            .and_then(|i| self.financials.get(i).copied().flatten())
    }

    /// Field text for every required column, in schema order
    pub fn fields(&self, schema: &FinancialsSchema) -> Vec<String> {
        let mut financials = self.financials.iter();

        schema
            .required_columns()
            .iter()
            .map(|column| match column.as_str() {
                YEAR_COLUMN => self.key.year.to_string(),
                PERIOD_COLUMN => self.key.period.to_string(),
                STORE_LOCATION_COLUMN => self.key.store_location.clone(),
                OPENED_COLUMN => match self.opened {
                    Some(true) => "1".to_string(),
                    Some(false) => "0".to_string(),
                    None => String::new(),
                },
                // Financial columns appear in required-column order
                _ => financials
                    .next()
                    .copied()
                    .flatten()
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            })
            .collect()
    }
}

/// A validated, key-unique set of records ready to reconcile
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    records: Vec<FinancialRecord>,
}

impl Batch {
    pub fn new(records: Vec<FinancialRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[FinancialRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FinancialRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a FinancialRecord;
    type IntoIter = std::slice::Iter<'a, FinancialRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ================================================================================================
// Staged File Writer
// ================================================================================================

/// Write a batch as staged CSV to any writer
pub fn write_batch_csv<W: Write>(
    writer: W,
    schema: &FinancialsSchema,
    batch: &Batch,
) -> CsvResult<()> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(writer);

    wtr.write_record(schema.required_columns())?;
    for record in batch {
        wtr.write_record(record.fields(schema))?;
    }

    wtr.flush()?;
    Ok(())
}

// ================================================================================================
// Tests
// ================================================================================================

/*!
# Dataset Validation

This module runs the data-quality pass that gates every warehouse load. The pass is a
pure function: it reads a [`Dataset`], never mutates it, and returns a
[`ValidationReport`] holding every problem found plus the normalized rows.

Checks run in a fixed order and accumulate, so an operator sees every problem in one
run. The only short-circuit is a missing required column, which stops the pass with a
single diagnostic.

1. Column presence (fatal)
2. Type normalization of YEAR, PERIOD, OPENED and the financial columns
3. Null key columns
4. YEAR / PERIOD ranges
5. Duplicate key tuples
6. Empty dataset
*/

use crate::coercion::{coerce_decimal, coerce_flag, coerce_integer, coerce_period, coerce_text};
use crate::dataset::Dataset;
use crate::errors::{CsvError, CsvResult};
use crate::records::{Batch, FinancialRecord, KeyTuple};
use crate::schemas::{
    FinancialsSchema, NumericPolicy, OPENED_COLUMN, PERIOD_COLUMN, STORE_LOCATION_COLUMN,
    YEAR_COLUMN,
};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Offending rows shown per range diagnostic
pub const RANGE_SAMPLE_LIMIT: usize = 3;

/// Distinct duplicated keys shown in the duplicate diagnostic
pub const DUPLICATE_SAMPLE_LIMIT: usize = 5;

// ================================================================================================
// Diagnostics
// ================================================================================================

/// Key columns of one input row after coercion; any part may be missing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySample {
    pub year: Option<i64>,
    pub period: Option<i64>,
    pub store_location: Option<String>,
}

impl fmt::Display for KeySample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year = self.year.map_or("null".to_string(), |y| y.to_string());
        let period = self.period.map_or("null".to_string(), |p| p.to_string());
        let store = self
            .store_location
            .as_ref()
            .map_or("null".to_string(), |s| format!("'{}'", s));
        write!(f, "({}, {}, {})", year, period, store)
    }
}

/// One data-quality problem
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    MissingColumns(Vec<String>),
    UncoercibleValues {
        column: String,
        count: usize,
    },
    NonNumericValues {
        column: String,
        count: usize,
    },
    UnrecognizedFlags {
        column: String,
        count: usize,
    },
    NullKeys {
        column: String,
        count: usize,
    },
    OutOfRange {
        column: String,
        count: usize,
        min: i64,
        max: i64,
        sample: Vec<KeySample>,
    },
    DuplicateKeys {
        count: usize,
        sample: Vec<KeySample>,
    },
    EmptyDataset,
}

fn join_samples(sample: &[KeySample]) -> String {
    sample
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingColumns(columns) => {
                write!(f, "Missing required columns: {}", columns.join(", "))
            }
            Diagnostic::UncoercibleValues { column, count } => write!(
                f,
                "Could not convert {} value(s) in {} to a number",
                count, column
            ),
            Diagnostic::NonNumericValues { column, count } => write!(
                f,
                "Column {} contains {} non-numeric value(s)",
                column, count
            ),
            Diagnostic::UnrecognizedFlags { column, count } => write!(
                f,
                "Column {} contains {} unrecognized flag value(s)",
                column, count
            ),
            Diagnostic::NullKeys { column, count } => {
                write!(f, "Found {} null values in key column: {}", count, column)
            }
            Diagnostic::OutOfRange {
                column,
                count,
                min,
                max,
                sample,
            } => write!(
                f,
                "Found {} rows with invalid {} (must be {}-{}); first rows: {}",
                count,
                column,
                min,
                max,
                join_samples(sample)
            ),
            Diagnostic::DuplicateKeys { count, sample } => write!(
                f,
                "Found {} duplicate rows based on YEAR, PERIOD, STORE_LOCATION; duplicated keys: {}",
                count,
                join_samples(sample)
            ),
            Diagnostic::EmptyDataset => write!(f, "Dataset is empty"),
        }
    }
}

// ================================================================================================
// Report
// ================================================================================================

/// A row after type normalization, before the key columns are known to be valid
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub year: Option<i64>,
    pub period: Option<i64>,
    pub store_location: Option<String>,
    pub opened: Option<bool>,
    pub financials: Vec<Option<Decimal>>,
}

impl NormalizedRow {
    pub fn key_sample(&self) -> KeySample {
        KeySample {
            year: self.year,
            period: self.period,
            store_location: self.store_location.clone(),
        }
    }
}

/// Outcome of one validation pass
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    diagnostics: Vec<Diagnostic>,
    rows: Vec<NormalizedRow>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics rendered for the operator, in check order
    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.iter().map(ToString::to_string).collect()
    }

    /// Normalized rows (empty when a required column was missing)
    pub fn rows(&self) -> &[NormalizedRow] {
        &self.rows
    }

    /// Convert a passing report into a typed batch
    pub fn into_batch(self) -> CsvResult<Batch> {
        if !self.is_valid() {
            return Err(CsvError::ValidationFailed(self.messages()));
        }

        let records = self
            .rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| into_record(i, row))
            .collect::<CsvResult<Vec<_>>>()?;

        Ok(Batch::new(records))
    }
}

fn into_record(index: usize, row: NormalizedRow) -> CsvResult<FinancialRecord> {
    let missing = || CsvError::InvalidFormat(format!("row {} has an incomplete key", index + 1));

    let year = row.year.ok_or_else(missing)?;
    let period = row.period.ok_or_else(missing)?;
    let store_location = row.store_location.ok_or_else(missing)?;

    let year = i32::try_from(year)
        .map_err(|_| CsvError::InvalidFormat(format!("YEAR {} does not fit", year)))?;
    let period = u32::try_from(period)
        .map_err(|_| CsvError::InvalidFormat(format!("PERIOD {} does not fit", period)))?;

    Ok(FinancialRecord {
        key: KeyTuple::new(year, period, store_location),
        opened: row.opened,
        financials: row.financials,
    })
}

// ================================================================================================
// Validation
// ================================================================================================

/// Validate a dataset against a schema
pub fn validate(dataset: &Dataset, schema: &FinancialsSchema) -> ValidationReport {
    let mut diagnostics = Vec::new();

    // 1. Column presence
    let missing: Vec<String> = schema
        .required_columns()
        .iter()
        .filter(|c| !dataset.has_column(c))
        .cloned()
        .collect();
    if !missing.is_empty() {
        debug!(missing = missing.len(), "required columns missing");
        return ValidationReport {
            diagnostics: vec![Diagnostic::MissingColumns(missing)],
            rows: Vec::new(),
        };
    }

    // 2. Type normalization
    let rows = normalize_rows(dataset, schema, &mut diagnostics);

    // 3. Key nullability
    check_null_keys(&rows, &mut diagnostics);

    // 4. Range checks
    check_range(
        &rows,
        YEAR_COLUMN,
        |r| r.year,
        schema.year_range().into_inner(),
        &mut diagnostics,
    );
    check_range(
        &rows,
        PERIOD_COLUMN,
        |r| r.period,
        schema.period_range().into_inner(),
        &mut diagnostics,
    );

    // 5. Duplicate keys
    check_duplicates(&rows, &mut diagnostics);

    // 6. Empty dataset
    if rows.is_empty() {
        diagnostics.push(Diagnostic::EmptyDataset);
    }

    debug!(
        rows = rows.len(),
        problems = diagnostics.len(),
        "validation finished"
    );
    ValidationReport { diagnostics, rows }
}

fn normalize_rows(
    dataset: &Dataset,
    schema: &FinancialsSchema,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<NormalizedRow> {
    // Presence was checked above, so every lookup succeeds
    let index = |name: &str| dataset.column_index(name).unwrap_or_default();
    let year_idx = index(YEAR_COLUMN);
    let period_idx = index(PERIOD_COLUMN);
    let store_idx = index(STORE_LOCATION_COLUMN);
    let opened_idx = index(OPENED_COLUMN);
    let financial_idx: Vec<usize> = schema
        .financial_columns()
        .iter()
        .map(|c| index(c))
        .collect();

    let mut bad_years = 0;
    let mut bad_periods = 0;
    let mut bad_flags = 0;
    let mut non_numeric = vec![0usize; financial_idx.len()];

    let rows = dataset
        .rows()
        .iter()
        .map(|cells| {
            let year = coerce_integer(&cells[year_idx]);
            let period = coerce_period(&cells[period_idx]);
            let opened = coerce_flag(&cells[opened_idx]);
            bad_years += usize::from(year.is_invalid());
            bad_periods += usize::from(period.is_invalid());
            bad_flags += usize::from(opened.is_invalid());

            let financials = financial_idx
                .iter()
                .enumerate()
                .map(|(i, &col)| {
                    let value = coerce_decimal(&cells[col]);
                    non_numeric[i] += usize::from(value.is_invalid());
                    value.value()
                })
                .collect();

            NormalizedRow {
                year: year.value(),
                period: period.value(),
                store_location: coerce_text(&cells[store_idx]),
                opened: opened.value(),
                financials,
            }
        })
        .collect();

    for (column, count) in [(YEAR_COLUMN, bad_years), (PERIOD_COLUMN, bad_periods)] {
        if count > 0 {
            diagnostics.push(Diagnostic::UncoercibleValues {
                column: column.to_string(),
                count,
            });
        }
    }

    if schema.rules().numeric_policy == NumericPolicy::Strict {
        for (column, &count) in schema.financial_columns().iter().zip(&non_numeric) {
            if count > 0 {
                diagnostics.push(Diagnostic::NonNumericValues {
                    column: column.clone(),
                    count,
                });
            }
        }
        if bad_flags > 0 {
            diagnostics.push(Diagnostic::UnrecognizedFlags {
                column: OPENED_COLUMN.to_string(),
                count: bad_flags,
            });
        }
    } else {
        let coerced: usize = non_numeric.iter().sum::<usize>() + bad_flags;
        if coerced > 0 {
            debug!(values = coerced, "non-numeric values replaced with null");
        }
    }

    rows
}

fn check_null_keys(rows: &[NormalizedRow], diagnostics: &mut Vec<Diagnostic>) {
    let counts = [
        (YEAR_COLUMN, rows.iter().filter(|r| r.year.is_none()).count()),
        (PERIOD_COLUMN, rows.iter().filter(|r| r.period.is_none()).count()),
        (
            STORE_LOCATION_COLUMN,
            rows.iter().filter(|r| r.store_location.is_none()).count(),
        ),
    ];

    for (column, count) in counts {
        if count > 0 {
            diagnostics.push(Diagnostic::NullKeys {
                column: column.to_string(),
                count,
            });
        }
    }
}

fn check_range<F>(
    rows: &[NormalizedRow],
    column: &str,
    value: F,
    (min, max): (i64, i64),
    diagnostics: &mut Vec<Diagnostic>,
) where
    F: Fn(&NormalizedRow) -> Option<i64>,
{
    // Nulls were already reported by the null-key check
    let offending: Vec<&NormalizedRow> = rows
        .iter()
        .filter(|&r| value(r).is_some_and(|v| v < min || v > max))
        .collect();

    if !offending.is_empty() {
        diagnostics.push(Diagnostic::OutOfRange {
            column: column.to_string(),
            count: offending.len(),
            min,
            max,
            sample: offending
                .iter()
                .take(RANGE_SAMPLE_LIMIT)
                .map(|r| r.key_sample())
                .collect(),
        });
    }
}

fn check_duplicates(rows: &[NormalizedRow], diagnostics: &mut Vec<Diagnostic>) {
    let mut occurrences: HashMap<KeySample, usize> = HashMap::new();
    for row in rows {
        *occurrences.entry(row.key_sample()).or_default() += 1;
    }

    let mut count = 0;
    let mut seen = HashSet::new();
    let mut sample = Vec::new();
    for row in rows {
        let key = row.key_sample();
        if occurrences[&key] > 1 {
            count += 1;
            if sample.len() < DUPLICATE_SAMPLE_LIMIT && seen.insert(key.clone()) {
                sample.push(key);
            }
        }
    }

    if count > 0 {
        diagnostics.push(Diagnostic::DuplicateKeys { count, sample });
    }
}

// ================================================================================================
// Tests
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Cell;
    use crate::schemas::{ValidationRules, REQUIRED_COLUMNS};

    fn row(year: Cell, period: &str, store: &str) -> Vec<Cell> {
        REQUIRED_COLUMNS
            .iter()
            .map(|c| match *c {
                "YEAR" => year.clone(),
                "PERIOD" => Cell::Text(period.to_string()),
                "STORE_LOCATION" => Cell::from(store),
                "OPENED" => Cell::Bool(true),
                _ => Cell::Float(100.0),
            })
            .collect()
    }

    fn dataset(rows: Vec<Vec<Cell>>) -> Dataset {
        Dataset::new(REQUIRED_COLUMNS.to_vec(), rows)
    }

    #[test]
    fn test_valid_dataset_produces_batch() {
        let schema = FinancialsSchema::standard();
        let data = dataset(vec![
            row(Cell::Int(2024), "P01", "NYC-01"),
            row(Cell::Int(2024), "P02", "NYC-01"),
        ]);

        let report = validate(&data, &schema);
        assert!(report.is_valid(), "{:?}", report.messages());

        let batch = report.into_batch().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.records()[1].key, KeyTuple::new(2024, 2, "NYC-01"));
        assert_eq!(batch.records()[0].opened, Some(true));
        assert_eq!(batch.records()[0].financials[0], Some(Decimal::from(100)));
    }

    #[test]
    fn test_missing_columns_short_circuit() {
        let schema = FinancialsSchema::standard();
        let columns: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| *c != "STORE_LOCATION" && *c != "RENT")
            .collect();
        // Duplicate rows that would otherwise be flagged
        let rows = vec![vec![Cell::Int(1999); columns.len()]; 2];
        let data = Dataset::new(columns, rows);

        let report = validate(&data, &schema);
        assert!(!report.is_valid());
        assert_eq!(
            report.diagnostics(),
            &[Diagnostic::MissingColumns(vec![
                "STORE_LOCATION".to_string(),
                "RENT".to_string()
            ])]
        );
        assert_eq!(
            report.messages(),
            vec!["Missing required columns: STORE_LOCATION, RENT"]
        );
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let schema = FinancialsSchema::standard();
        let mut columns: Vec<&str> = REQUIRED_COLUMNS.to_vec();
        columns.push("NOTES");
        let mut r = row(Cell::Int(2024), "1", "NYC-01");
        r.push(Cell::Text("anything".into()));

        let report = validate(&Dataset::new(columns, vec![r]), &schema);
        assert!(report.is_valid());
    }

    #[test]
    fn test_year_boundaries() {
        let schema = FinancialsSchema::standard();
        let data = dataset(vec![
            row(Cell::Int(2019), "1", "A"),
            row(Cell::Int(2030), "1", "B"),
            row(Cell::Int(2018), "1", "C"),
            row(Cell::Int(2031), "1", "D"),
        ]);

        let report = validate(&data, &schema);
        match report.diagnostics() {
            [Diagnostic::OutOfRange {
                column,
                count,
                sample,
                ..
            }] => {
                assert_eq!(column, "YEAR");
                assert_eq!(*count, 2);
                assert_eq!(sample[0].year, Some(2018));
                assert_eq!(sample[1].year, Some(2031));
            }
            other => panic!("unexpected diagnostics: {:?}", other),
        }
    }

    #[test]
    fn test_range_sample_is_bounded() {
        let schema = FinancialsSchema::standard();
        let data = dataset(
            (0..6)
                .map(|i| row(Cell::Int(2024), "14", &format!("S{}", i)))
                .collect(),
        );

        let report = validate(&data, &schema);
        let message = &report.messages()[0];
        assert!(message.starts_with("Found 6 rows with invalid PERIOD (must be 1-13)"));
        assert!(message.contains("'S2'"));
        assert!(!message.contains("'S3'"));
    }

    #[test]
    fn test_null_and_uncoercible_keys_accumulate() {
        let schema = FinancialsSchema::standard();
        let data = dataset(vec![
            row(Cell::Text("twenty".into()), "P1", "A"),
            row(Cell::Int(2024), "", ""),
        ]);

        let report = validate(&data, &schema);
        assert_eq!(
            report.messages(),
            vec![
                "Could not convert 1 value(s) in YEAR to a number",
                "Found 1 null values in key column: YEAR",
                "Found 1 null values in key column: PERIOD",
                "Found 1 null values in key column: STORE_LOCATION",
            ]
        );
        // Rows are flagged, not dropped
        assert_eq!(report.rows().len(), 2);
    }

    #[test]
    fn test_duplicates_flagged_with_bounded_sample() {
        let schema = FinancialsSchema::standard();
        let mut rows = Vec::new();
        for store in ["A", "B", "C", "D", "E", "F"] {
            rows.push(row(Cell::Int(2024), "P1", store));
            rows.push(row(Cell::Int(2024), "1", store));
        }
        rows.push(row(Cell::Int(2024), "2", "A"));

        let report = validate(&dataset(rows), &schema);
        match report.diagnostics() {
            [Diagnostic::DuplicateKeys { count, sample }] => {
                assert_eq!(*count, 12);
                assert_eq!(sample.len(), DUPLICATE_SAMPLE_LIMIT);
                assert_eq!(sample[0].store_location.as_deref(), Some("A"));
            }
            other => panic!("unexpected diagnostics: {:?}", other),
        }
    }

    #[test]
    fn test_empty_dataset() {
        let schema = FinancialsSchema::standard();
        let report = validate(&dataset(vec![]), &schema);

        assert_eq!(report.diagnostics(), &[Diagnostic::EmptyDataset]);
        assert!(report.into_batch().is_err());
    }

    #[test]
    fn test_lenient_policy_nulls_non_numeric() {
        let schema = FinancialsSchema::standard();
        let mut r = row(Cell::Int(2024), "1", "A");
        r[4] = Cell::Text("n/a".into()); // SALES
        r[2] = Cell::Text("sometimes".into()); // OPENED

        let report = validate(&dataset(vec![r]), &schema);
        assert!(report.is_valid());
        let batch = report.into_batch().unwrap();
        assert_eq!(batch.records()[0].financials[0], None);
        assert_eq!(batch.records()[0].opened, None);
    }

    #[test]
    fn test_strict_policy_flags_non_numeric() {
        let rules = ValidationRules {
            numeric_policy: NumericPolicy::Strict,
            ..Default::default()
        };
        let schema = FinancialsSchema::with_rules(rules).unwrap();
        let mut r = row(Cell::Int(2024), "1", "A");
        r[4] = Cell::Text("n/a".into());
        r[2] = Cell::Text("sometimes".into());

        let report = validate(&dataset(vec![r]), &schema);
        assert_eq!(
            report.messages(),
            vec![
                "Column SALES contains 1 non-numeric value(s)",
                "Column OPENED contains 1 unrecognized flag value(s)",
            ]
        );
    }

    #[test]
    fn test_input_is_not_mutated() {
        let schema = FinancialsSchema::standard();
        let data = dataset(vec![row(Cell::Text("2024".into()), "P03", " A ")]);
        let before = data.clone();

        let report = validate(&data, &schema);
        assert!(report.is_valid());
        assert_eq!(data, before);
        assert_eq!(report.rows()[0].period, Some(3));
        assert_eq!(report.rows()[0].store_location.as_deref(), Some("A"));
    }
}

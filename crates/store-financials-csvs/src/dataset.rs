/*!
# Tabular Input

A [`Dataset`] is the raw, untyped view of an input file: normalized header names plus
rows of [`Cell`]s. Readers never coerce values; that is the validator's job.
*/

use crate::errors::{CsvError, CsvResult};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// One raw cell value as it came out of the file
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

/// Named columns over rows of cells
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Trim and upper-case a header so it matches the warehouse column name
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_uppercase()
}

impl Dataset {
    /// Build a dataset, normalizing header names and squaring ragged rows
    pub fn new<S: AsRef<str>>(columns: Vec<S>, rows: Vec<Vec<Cell>>) -> Self {
        let columns: Vec<String> = columns
            .iter()
            .map(|c| normalize_column_name(c.as_ref()))
            .collect();
        let width = columns.len();

        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First column with this (normalized) name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = normalize_column_name(name);
        self.columns.iter().position(|c| *c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }
}

// ================================================================================================
// Readers
// ================================================================================================

/// Read a spreadsheet or CSV file, picking the reader from the extension
pub fn read_dataset<P: AsRef<Path>>(path: P) -> CsvResult<Dataset> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CsvError::FileNotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let dataset = match extension.as_str() {
        "csv" => read_csv_dataset(path)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook_dataset(path)?,
        other => {
            return Err(CsvError::UnsupportedFormat(format!(
                "'{}' ({})",
                other,
                path.display()
            )))
        }
    };

    debug!(
        path = %path.display(),
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "read input file"
    );
    Ok(dataset)
}

/// Read a header-bearing CSV file
pub fn read_csv_dataset<P: AsRef<Path>>(path: P) -> CsvResult<Dataset> {
    let file = std::fs::File::open(path)?;
    parse_csv_dataset(file)
}

/// Parse header-bearing CSV from any reader
pub fn parse_csv_dataset<R: Read>(reader: R) -> CsvResult<Dataset> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::from).collect());
    }

    Ok(Dataset::new(headers, rows))
}

/// Read the first worksheet of a workbook; the first row is the header
pub fn read_workbook_dataset<P: AsRef<Path>>(path: P) -> CsvResult<Dataset> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CsvError::EmptyWorkbook(path.to_path_buf()))??;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = match rows_iter.next() {
        Some(header_row) => header_row.iter().map(header_text).collect(),
        None => Vec::new(),
    };

    let rows = rows_iter
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    Ok(Dataset::new(headers, rows))
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        _ => String::new(),
    }
}

fn cell_from_data(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::DateTime(format!("{}", dt)),
        Data::DateTimeIso(s) => Cell::DateTime(s.clone()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

// ================================================================================================
// Tests
// ================================================================================================

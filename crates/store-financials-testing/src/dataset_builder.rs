use std::collections::HashMap;
use std::path::Path;
use store_financials_csvs::{Cell, Dataset, REQUIRED_COLUMNS};

/// Amount every financial column gets unless a row overrides it
pub const DEFAULT_AMOUNT: &str = "100.00";

/// One input row with every required column populated
#[derive(Debug, Clone)]
pub struct FinancialRow {
    cells: HashMap<String, Cell>,
}

impl FinancialRow {
    pub fn new(year: i64, period: &str, store_location: &str) -> Self {
        let mut cells: HashMap<String, Cell> = REQUIRED_COLUMNS
            .iter()
            .map(|c| (c.to_string(), Cell::Text(DEFAULT_AMOUNT.to_string())))
            .collect();

        cells.insert("YEAR".into(), Cell::Int(year));
        cells.insert("PERIOD".into(), Cell::from(period));
        cells.insert("STORE_LOCATION".into(), Cell::from(store_location));
        cells.insert("OPENED".into(), Cell::Text("Y".into()));

        Self { cells }
    }

    /// Override one column
    pub fn set(mut self, column: &str, cell: Cell) -> Self {
        self.cells.insert(column.to_string(), cell);
        self
    }

    /// Override one column with text ("" becomes an empty cell)
    pub fn text(self, column: &str, value: &str) -> Self {
        self.set(column, Cell::from(value))
    }

    pub fn clear(self, column: &str) -> Self {
        self.set(column, Cell::Empty)
    }

    fn cells_for(&self, columns: &[&str]) -> Vec<Cell> {
        columns
            .iter()
            .map(|c| self.cells.get(*c).cloned().unwrap_or(Cell::Empty))
            .collect()
    }
}

/// Dataset with every required column
pub fn dataset(rows: Vec<FinancialRow>) -> Dataset {
    dataset_without(&[], rows)
}

/// Dataset missing the named columns
pub fn dataset_without(missing: &[&str], rows: Vec<FinancialRow>) -> Dataset {
    let columns: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !missing.contains(c))
        .collect();
    let cells = rows.iter().map(|r| r.cells_for(&columns)).collect();

    Dataset::new(columns, cells)
}

/// Three stores over two periods, all valid
pub fn sample_dataset() -> Dataset {
    let mut rows = Vec::new();
    for store in ["Downtown", "Airport", "Mall"] {
        for period in ["P01", "P02"] {
            rows.push(FinancialRow::new(2024, period, store));
        }
    }
    dataset(rows)
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) | Cell::DateTime(s) => s.clone(),
        Cell::Int(i) => i.to_string(),
        Cell::Float(f) => f.to_string(),
        Cell::Bool(b) => b.to_string(),
    }
}

/// Write a dataset as a header-bearing CSV input file
pub fn write_dataset_csv(path: &Path, dataset: &Dataset) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(dataset.columns())?;
    for row in dataset.rows() {
        wtr.write_record(row.iter().map(cell_text))?;
    }
    wtr.flush()?;
    Ok(())
}

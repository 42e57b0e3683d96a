/*!
# SQLite Warehouse

[`SqliteWarehouse`] is the local warehouse backend. A stage is a directory under the
configured stage root; the holding table is a `TEMP` table, so it lives only as long as
the connection; the target table is an ordinary table keyed on the merge key.
*/

use crate::merge::MergeSpec;
use crate::schema::{
    create_holding_table_sql, create_target_table_sql, quote_ident, table_columns, table_exists,
    ColumnKind, TableLayout, CREATED_AT_COLUMN, UPDATED_AT_COLUMN,
};
use crate::warehouse::{MergeCounts, StagedFile, TableNames, Warehouse};
use crate::{DbError, DbResult};
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Where the warehouse lives and which tables a session uses
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub db_path: PathBuf,
    pub stage_dir: PathBuf,
    pub tables: TableNames,
}

/// One target-table row read back by column name
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl StoredRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    pub fn integer(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            Value::Integer(i) => Some(*i),
            Value::Real(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn text(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            Value::Text(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(f) => Some(f.to_string()),
            _ => None,
        }
    }

    pub fn decimal(&self, column: &str) -> Option<Decimal> {
        let value = match self.get(column)? {
            Value::Integer(i) => Some(Decimal::from(*i)),
            Value::Real(f) => Decimal::from_f64(*f),
            Value::Text(s) => Decimal::from_str(s).ok(),
            _ => None,
        };
        value.map(|d| d.normalize())
    }

    pub fn timestamp(&self, column: &str) -> Option<DateTime<Utc>> {
        let value = self.get(column)?;
        DateTime::<Utc>::column_result(ValueRef::from(value)).ok()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(CREATED_AT_COLUMN)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(UPDATED_AT_COLUMN)
    }
}

/// Warehouse backed by a single SQLite database file
pub struct SqliteWarehouse {
    conn: Connection,
    stage_root: PathBuf,
    tables: TableNames,
}

impl SqliteWarehouse {
    /// Open (or create) the database file named in the config
    pub fn open(config: &WarehouseConfig) -> DbResult<Self> {
        let conn = Connection::open(&config.db_path).map_err(|e| {
            DbError::Connection(format!(
                "Failed to open database {}: {}",
                config.db_path.display(),
                e
            ))
        })?;

        info!(
            database = %config.db_path.display(),
            target = %config.tables.target,
            "Successfully connected to warehouse"
        );

        Ok(Self {
            conn,
            stage_root: config.stage_dir.clone(),
            tables: config.tables.clone(),
        })
    }

    /// Open a throwaway in-memory warehouse
    pub fn open_in_memory(stage_dir: &Path, tables: TableNames) -> DbResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            DbError::Connection(format!("Failed to create in-memory database: {}", e))
        })?;

        Ok(Self {
            conn,
            stage_root: stage_dir.to_path_buf(),
            tables,
        })
    }

    /// Get reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Round trip that proves the connection is usable
    pub fn ping(&self) -> DbResult<String> {
        let version: String = self
            .conn
            .query_row("SELECT sqlite_version()", [], |row| row.get(0))?;
        Ok(version)
    }

    /// Create the target table if it does not exist; returns true if it was created
    pub fn ensure_target_table(&self, layout: &TableLayout) -> DbResult<bool> {
        if self.target_exists()? {
            debug!(table = %self.tables.target, "target table already exists");
            return Ok(false);
        }

        self.conn
            .execute_batch(&create_target_table_sql(&self.tables.target, layout))?;
        info!(table = %self.tables.target, "Created target table");
        Ok(true)
    }

    pub fn target_exists(&self) -> DbResult<bool> {
        table_exists(&self.conn, &self.tables.target)
    }

    pub fn row_count(&self) -> DbResult<u64> {
        self.count_rows(&self.tables.target)
    }

    pub fn holding_row_count(&self) -> DbResult<u64> {
        self.count_rows(&self.tables.holding)
    }

    fn count_rows(&self, table: &str) -> DbResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Every target row in insertion order
    pub fn fetch_rows(&self) -> DbResult<Vec<StoredRow>> {
        let sql = format!("SELECT * FROM {} ORDER BY rowid", quote_ident(&self.tables.target));
        self.query_rows(&sql, Vec::new())
    }

    /// Target row matching every given column value
    pub fn find_row(&self, key: &[(&str, Value)]) -> DbResult<Option<StoredRow>> {
        let predicate = key
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ?{}", quote_ident(column), i + 1))
            .collect::<Vec<_>>()
            .join(" AND ");
        let sql = format!(
            "SELECT * FROM {} WHERE {}",
            quote_ident(&self.tables.target),
            predicate
        );
        let values = key.iter().map(|(_, v)| v.clone()).collect();

        Ok(self.query_rows(&sql, values)?.into_iter().next())
    }

    fn query_rows(&self, sql: &str, values: Vec<Value>) -> DbResult<Vec<StoredRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .map(|values| {
                values.map(|values| StoredRow {
                    columns: columns.clone(),
                    values,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn stage_path(&self) -> PathBuf {
        self.stage_root.join(&self.tables.stage)
    }

    /// Close the connection and report any error from doing so
    pub fn close(self) -> DbResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| DbError::Connection(format!("Failed to close connection: {}", e)))
    }
}

fn load_value(kind: ColumnKind, field: &str, line: u64, column: &str) -> DbResult<Value> {
    if field.is_empty() {
        return Ok(Value::Null);
    }

    match kind {
        ColumnKind::Integer => field.parse::<i64>().map(Value::Integer).map_err(|_| {
            DbError::Load(format!(
                "line {}: column {} expects an integer, found '{}'",
                line, column, field
            ))
        }),
        ColumnKind::Numeric => match field.parse::<f64>() {
            Ok(_) => Ok(Value::Text(field.to_string())),
            Err(_) => Err(DbError::Load(format!(
                "line {}: column {} expects a number, found '{}'",
                line, column, field
            ))),
        },
        ColumnKind::Decimal => Decimal::from_str(field)
            .or_else(|_| Decimal::from_scientific(field))
            .map(|d| Value::Text(d.normalize().to_string()))
            .map_err(|_| {
                DbError::Load(format!(
                    "line {}: column {} expects a decimal, found '{}'",
                    line, column, field
                ))
            }),
        ColumnKind::Text => Ok(Value::Text(field.to_string())),
    }
}

impl Warehouse for SqliteWarehouse {
    fn ensure_stage(&mut self) -> DbResult<()> {
        let path = self.stage_path();
        fs::create_dir_all(&path).map_err(|e| {
            DbError::Stage(format!("Failed to create stage {}: {}", path.display(), e))
        })?;
        debug!(stage = %self.tables.stage, path = %path.display(), "stage ready");
        Ok(())
    }

    fn upload(&mut self, local_file: &Path, file_name: &str) -> DbResult<StagedFile> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(DbError::Stage(format!(
                "Invalid staged file name '{}'",
                file_name
            )));
        }
        if !local_file.is_file() {
            return Err(DbError::Stage(format!(
                "Local file does not exist: {}",
                local_file.display()
            )));
        }

        let path = self.stage_path().join(file_name);
        fs::copy(local_file, &path).map_err(|e| {
            DbError::Stage(format!(
                "Failed to upload {} to stage {}: {}",
                local_file.display(),
                self.tables.stage,
                e
            ))
        })?;

        let staged = StagedFile {
            stage: self.tables.stage.clone(),
            file_name: file_name.to_string(),
            path,
        };
        info!(staged = %staged, "Uploaded file to stage");
        Ok(staged)
    }

    fn reset_holding_table(&mut self) -> DbResult<()> {
        let columns: Vec<_> = table_columns(&self.conn, "main", &self.tables.target)?
            .into_iter()
            .filter(|c| c.name != CREATED_AT_COLUMN && c.name != UPDATED_AT_COLUMN)
            .collect();
        if columns.is_empty() {
            return Err(DbError::InvalidConfig(format!(
                "Target table {} does not exist",
                self.tables.target
            )));
        }

        self.conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS temp.{}",
            quote_ident(&self.tables.holding)
        ))?;
        self.conn
            .execute_batch(&create_holding_table_sql(&self.tables.holding, &columns))?;

        info!(table = %self.tables.holding, "Created holding table");
        Ok(())
    }

    fn load(&mut self, staged: &StagedFile, columns: &[String]) -> DbResult<u64> {
        let holding = table_columns(&self.conn, "temp", &self.tables.holding)?;
        if holding.is_empty() {
            return Err(DbError::Load(format!(
                "Holding table {} does not exist",
                self.tables.holding
            )));
        }

        let kinds = columns
            .iter()
            .map(|name| {
                holding
                    .iter()
                    .find(|c| &c.name == name)
                    .map(|c| c.kind)
                    .ok_or_else(|| {
                        DbError::Load(format!(
                            "Column {} is not in holding table {}",
                            name, self.tables.holding
                        ))
                    })
            })
            .collect::<DbResult<Vec<_>>>()?;

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(staged.path())?;
        let header_width = rdr.headers()?.len();
        if header_width != columns.len() {
            return Err(DbError::Load(format!(
                "{} has {} columns, expected {}",
                staged,
                header_width,
                columns.len()
            )));
        }

        let insert_sql = format!(
            "INSERT INTO temp.{} ({}) VALUES ({})",
            quote_ident(&self.tables.holding),
            columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", "),
            (1..=columns.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let tx = self
            .conn
            .transaction()
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        let mut loaded = 0u64;
        {
            let mut stmt = tx.prepare(&insert_sql)?;
            for (index, result) in rdr.records().enumerate() {
                let line = index as u64 + 2;
                let record = result?;
                if record.len() != columns.len() {
                    return Err(DbError::Load(format!(
                        "line {}: expected {} fields, found {}",
                        line,
                        columns.len(),
                        record.len()
                    )));
                }

                let values = record
                    .iter()
                    .zip(kinds.iter().zip(columns))
                    .map(|(field, (kind, column))| load_value(*kind, field, line, column))
                    .collect::<DbResult<Vec<_>>>()?;
                stmt.execute(params_from_iter(values))?;
                loaded += 1;
            }
        }

        tx.commit()
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        info!(rows = loaded, staged = %staged, table = %self.tables.holding, "Loaded staged file");
        Ok(loaded)
    }

    fn merge(&mut self, spec: &MergeSpec, load_timestamp: DateTime<Utc>) -> DbResult<MergeCounts> {
        let target = &self.tables.target;
        let holding = &self.tables.holding;
        debug!(sql = %spec.merge_sql(target, holding), "merging holding table into target");

        let update_sql = spec.update_sql(target, holding);
        let insert_sql = spec.insert_sql(target, holding);

        let tx = self
            .conn
            .transaction()
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        let rows_updated = tx.execute(&update_sql, params![load_timestamp])?;
        let rows_inserted = tx.execute(&insert_sql, params![load_timestamp])?;

        tx.commit()
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        let counts = MergeCounts {
            rows_inserted: rows_inserted as u64,
            rows_updated: rows_updated as u64,
        };
        info!(
            rows_inserted = counts.rows_inserted,
            rows_updated = counts.rows_updated,
            target = %self.tables.target,
            "Merge complete"
        );
        Ok(counts)
    }

    fn remove_staged(&mut self, staged: &StagedFile) -> DbResult<()> {
        fs::remove_file(staged.path()).map_err(|e| {
            DbError::Stage(format!("Failed to remove {} from stage: {}", staged, e))
        })?;
        debug!(staged = %staged, "Removed staged file");
        Ok(())
    }

    fn table_names(&self) -> &TableNames {
        &self.tables
    }
}

// ================================================================================================
// Tests
// ================================================================================================

/*!
# Warehouse Table Layout

Column layout of the target table, DDL for the target and its holding table, and the
identifier rules every table or column name must pass before it is spliced into SQL.
*/

use crate::{DbError, DbResult};
use rusqlite::Connection;

/// Audit column stamped when a row is first inserted
pub const CREATED_AT_COLUMN: &str = "CREATED_AT";

/// Audit column stamped when a row's values change
pub const UPDATED_AT_COLUMN: &str = "UPDATED_AT";

/// Storage class of one warehouse column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Numeric,
    /// Exact decimal held as canonical text, so equality is exact at any precision
    Decimal,
    Text,
}

impl ColumnKind {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Numeric => "NUMERIC",
            ColumnKind::Decimal => "DECIMAL_TEXT",
            ColumnKind::Text => "TEXT",
        }
    }

    /// Map a declared SQLite column type back to a kind, following SQLite's affinity rules
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.to_uppercase();
        if upper == "DECIMAL_TEXT" {
            ColumnKind::Decimal
        } else if upper.contains("INT") {
            ColumnKind::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            ColumnKind::Text
        } else {
            ColumnKind::Numeric
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Business columns of the target table, in load order, plus its merge key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    columns: Vec<ColumnDef>,
    key_columns: Vec<String>,
}

impl TableLayout {
    pub fn new(columns: Vec<ColumnDef>, key_columns: Vec<String>) -> DbResult<Self> {
        for column in &columns {
            validate_identifier(&column.name)?;
            if column.name == CREATED_AT_COLUMN || column.name == UPDATED_AT_COLUMN {
                return Err(DbError::InvalidConfig(format!(
                    "Column {} is reserved for audit timestamps",
                    column.name
                )));
            }
        }
        if key_columns.is_empty() {
            return Err(DbError::InvalidConfig(
                "Table layout needs at least one key column".to_string(),
            ));
        }
        for key in &key_columns {
            if !columns.iter().any(|c| &c.name == key) {
                return Err(DbError::InvalidConfig(format!(
                    "Key column {} is not part of the layout",
                    key
                )));
            }
        }

        Ok(Self {
            columns,
            key_columns,
        })
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    fn is_key(&self, name: &str) -> bool {
        self.key_columns.iter().any(|k| k == name)
    }
}

// ================================================================================================
// Identifiers
// ================================================================================================

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Reject names that could not be used as a bare table or column identifier
pub fn validate_identifier(name: &str) -> DbResult<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(format!("'{}'", name)))
    }
}

/// Double-quote an already validated identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name)
}

// ================================================================================================
// DDL
// ================================================================================================

/// `CREATE TABLE IF NOT EXISTS` for the target, with audit columns and the key as primary key
pub fn create_target_table_sql(table: &str, layout: &TableLayout) -> String {
    let mut lines: Vec<String> = layout
        .columns()
        .iter()
        .map(|c| {
            let not_null = if layout.is_key(&c.name) { " NOT NULL" } else { "" };
            format!("    {} {}{}", quote_ident(&c.name), c.kind.sql_type(), not_null)
        })
        .collect();

    lines.push(format!("    {} TIMESTAMP", quote_ident(CREATED_AT_COLUMN)));
    lines.push(format!("    {} TIMESTAMP", quote_ident(UPDATED_AT_COLUMN)));

    let key = layout
        .key_columns()
        .iter()
        .map(|k| quote_ident(k))
        .collect::<Vec<_>>()
        .join(", ");
    lines.push(format!("    PRIMARY KEY ({})", key));

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
        quote_ident(table),
        lines.join(",\n")
    )
}

/// `CREATE TEMP TABLE` mirroring the given business columns, without audit columns
pub fn create_holding_table_sql(table: &str, columns: &[ColumnDef]) -> String {
    let body = columns
        .iter()
        .map(|c| format!("    {} {}", quote_ident(&c.name), c.kind.sql_type()))
        .collect::<Vec<_>>()
        .join(",\n");

    format!("CREATE TEMP TABLE {} (\n{}\n)", quote_ident(table), body)
}

// ================================================================================================
// Introspection
// ================================================================================================

/// Whether a table exists in the main or temp schema
pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1
         UNION ALL
         SELECT name FROM sqlite_temp_master WHERE type = 'table' AND name = ?1",
    )?;
    let mut rows = stmt.query([table])?;
    let exists = rows.next()?.is_some();
    Ok(exists)
}

/// Declared columns of a table in ordinal order, empty if the table does not exist
pub fn table_columns(conn: &Connection, schema: &str, table: &str) -> DbResult<Vec<ColumnDef>> {
    let sql = format!("PRAGMA {}.table_info({})", schema, quote_ident(table));
    let mut stmt = conn.prepare(&sql)?;

    let columns = stmt
        .query_map([], |row| {
            let name: String = row.get(1)?;
            let declared: String = row.get(2)?;
            Ok(ColumnDef::new(name, ColumnKind::from_declared(&declared)))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(columns)
}

// ================================================================================================
// Tests
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> TableLayout {
        TableLayout::new(
            vec![
                ColumnDef::new("YEAR", ColumnKind::Integer),
                ColumnDef::new("PERIOD", ColumnKind::Integer),
                ColumnDef::new("STORE_LOCATION", ColumnKind::Text),
                ColumnDef::new("SALES", ColumnKind::Decimal),
            ],
            vec!["YEAR".into(), "PERIOD".into(), "STORE_LOCATION".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_identifier_rules() {
        assert!(validate_identifier("RAW_STORE_FINANCIALS").is_ok());
        assert!(validate_identifier("_t1").is_ok());
        assert!(validate_identifier("1TABLE").is_err());
        assert!(validate_identifier("T; DROP TABLE X").is_err());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("a\"b").is_err());
    }

    #[test]
    fn test_layout_rejects_unknown_key() {
        let err = TableLayout::new(
            vec![ColumnDef::new("YEAR", ColumnKind::Integer)],
            vec!["PERIOD".into()],
        )
        .unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig(_)));
    }

    #[test]
    fn test_layout_rejects_audit_column_names() {
        let err = TableLayout::new(
            vec![ColumnDef::new("UPDATED_AT", ColumnKind::Text)],
            vec!["UPDATED_AT".into()],
        )
        .unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_declared_type_affinity() {
        assert_eq!(ColumnKind::from_declared("INTEGER"), ColumnKind::Integer);
        assert_eq!(ColumnKind::from_declared("bigint"), ColumnKind::Integer);
        assert_eq!(ColumnKind::from_declared("VARCHAR(64)"), ColumnKind::Text);
        assert_eq!(ColumnKind::from_declared("NUMERIC"), ColumnKind::Numeric);
        assert_eq!(ColumnKind::from_declared("TIMESTAMP"), ColumnKind::Numeric);
        assert_eq!(ColumnKind::from_declared("DECIMAL_TEXT"), ColumnKind::Decimal);
        assert_eq!(ColumnKind::from_declared("DECIMAL(18,2)"), ColumnKind::Numeric);
    }

    #[test]
    fn test_target_ddl_creates_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&create_target_table_sql("RAW_STORE_FINANCIALS", &layout()))
            .unwrap();

        assert!(table_exists(&conn, "RAW_STORE_FINANCIALS").unwrap());
        let columns = table_columns(&conn, "main", "RAW_STORE_FINANCIALS").unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["YEAR", "PERIOD", "STORE_LOCATION", "SALES", "CREATED_AT", "UPDATED_AT"]
        );
        assert_eq!(columns[3].kind, ColumnKind::Decimal);
    }

    #[test]
    fn test_holding_ddl_is_temporary() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&create_holding_table_sql("HOLDING", layout().columns()))
            .unwrap();

        assert!(table_exists(&conn, "HOLDING").unwrap());
        assert!(table_columns(&conn, "main", "HOLDING").unwrap().is_empty());
        assert_eq!(table_columns(&conn, "temp", "HOLDING").unwrap().len(), 4);
    }
}

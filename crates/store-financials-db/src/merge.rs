/*!
# Merge Specification

A [`MergeSpec`] describes the set-based reconcile of a holding table into a target table:
which columns identify a row, which columns are compared to detect a change, and which
columns are written.

SQLite has no `MERGE`, so the warehouse executes a merge as two statements inside one
transaction:

1. `UPDATE ... FROM` for key matches where at least one compared column differs. The
   comparison uses `IS NOT`, so a null on one side and a value on the other counts as a
   change while null against null does not.
2. `INSERT ... SELECT ... WHERE NOT EXISTS` for keys missing from the target.

Inserted rows get `CREATED_AT` set to the load timestamp and a null `UPDATED_AT`; updated
rows get `UPDATED_AT` set and keep their `CREATED_AT`. Key matches with no differing column
are left alone. Both statements bind the load timestamp as `?1`.

[`MergeSpec::merge_sql`] renders the same reconcile as a single ANSI `MERGE`, which is what
gets logged.
*/

use crate::schema::{quote_ident, validate_identifier, CREATED_AT_COLUMN, UPDATED_AT_COLUMN};
use crate::{DbError, DbResult};

const TARGET_ALIAS: &str = "tgt";
const SOURCE_ALIAS: &str = "src";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSpec {
    key_columns: Vec<String>,
    change_columns: Vec<String>,
    update_columns: Vec<String>,
    insert_columns: Vec<String>,
    created_at_column: String,
    updated_at_column: String,
}

impl MergeSpec {
    /// Update columns default to the change columns
    pub fn new(
        key_columns: Vec<String>,
        change_columns: Vec<String>,
        insert_columns: Vec<String>,
    ) -> DbResult<Self> {
        if key_columns.is_empty() {
            return Err(DbError::InvalidConfig(
                "Merge needs at least one key column".to_string(),
            ));
        }
        if change_columns.is_empty() {
            return Err(DbError::InvalidConfig(
                "Merge needs at least one change column".to_string(),
            ));
        }
        for column in key_columns
            .iter()
            .chain(&change_columns)
            .chain(&insert_columns)
        {
            validate_identifier(column)?;
        }
        for key in &key_columns {
            if !insert_columns.contains(key) {
                return Err(DbError::InvalidConfig(format!(
                    "Key column {} must be inserted",
                    key
                )));
            }
            if change_columns.contains(key) {
                return Err(DbError::InvalidConfig(format!(
                    "Key column {} cannot also be a change column",
                    key
                )));
            }
        }

        Ok(Self {
            update_columns: change_columns.clone(),
            key_columns,
            change_columns,
            insert_columns,
            created_at_column: CREATED_AT_COLUMN.to_string(),
            updated_at_column: UPDATED_AT_COLUMN.to_string(),
        })
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    pub fn change_columns(&self) -> &[String] {
        &self.change_columns
    }

    pub fn update_columns(&self) -> &[String] {
        &self.update_columns
    }

    pub fn insert_columns(&self) -> &[String] {
        &self.insert_columns
    }

    /// `tgt.K = src.K AND ...` over every key column
    pub fn join_predicate(&self) -> String {
        self.key_columns
            .iter()
            .map(|k| {
                let k = quote_ident(k);
                format!("{}.{} = {}.{}", TARGET_ALIAS, k, SOURCE_ALIAS, k)
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Null-safe "any compared column differs" predicate
    pub fn change_predicate(&self) -> String {
        let terms = self
            .change_columns
            .iter()
            .map(|c| {
                let c = quote_ident(c);
                format!("{}.{} IS NOT {}.{}", TARGET_ALIAS, c, SOURCE_ALIAS, c)
            })
            .collect::<Vec<_>>()
            .join("\n    OR ");
        format!("(\n    {}\n)", terms)
    }

    fn set_list(&self, qualify_target: bool) -> String {
        let mut assignments: Vec<String> = self
            .update_columns
            .iter()
            .map(|c| {
                let c = quote_ident(c);
                if qualify_target {
                    format!("{}.{} = {}.{}", TARGET_ALIAS, c, SOURCE_ALIAS, c)
                } else {
                    format!("{} = {}.{}", c, SOURCE_ALIAS, c)
                }
            })
            .collect();

        let updated_at = quote_ident(&self.updated_at_column);
        assignments.push(if qualify_target {
            format!("{}.{} = ?1", TARGET_ALIAS, updated_at)
        } else {
            format!("{} = ?1", updated_at)
        });
        assignments.join(",\n    ")
    }

    fn insert_lists(&self) -> (String, String) {
        let mut columns: Vec<String> = self.insert_columns.iter().map(|c| quote_ident(c)).collect();
        let mut values: Vec<String> = self
            .insert_columns
            .iter()
            .map(|c| format!("{}.{}", SOURCE_ALIAS, quote_ident(c)))
            .collect();

        columns.push(quote_ident(&self.created_at_column));
        columns.push(quote_ident(&self.updated_at_column));
        values.push("?1".to_string());
        values.push("NULL".to_string());

        (columns.join(", "), values.join(", "))
    }

    /// Rewrite changed rows that already exist in the target
    pub fn update_sql(&self, target: &str, source: &str) -> String {
        format!(
            "UPDATE {target} AS {tgt}\nSET {set}\nFROM {source} AS {src}\nWHERE {join}\n  AND {changed}",
            target = quote_ident(target),
            tgt = TARGET_ALIAS,
            set = self.set_list(false),
            source = quote_ident(source),
            src = SOURCE_ALIAS,
            join = self.join_predicate(),
            changed = self.change_predicate(),
        )
    }

    /// Add source rows whose key is absent from the target
    pub fn insert_sql(&self, target: &str, source: &str) -> String {
        let (columns, values) = self.insert_lists();
        format!(
            "INSERT INTO {target} ({columns})\nSELECT {values}\nFROM {source} AS {src}\nWHERE NOT EXISTS (\n  SELECT 1 FROM {target} AS {tgt} WHERE {join}\n)",
            target = quote_ident(target),
            columns = columns,
            values = values,
            source = quote_ident(source),
            src = SOURCE_ALIAS,
            tgt = TARGET_ALIAS,
            join = self.join_predicate(),
        )
    }

    /// Single-statement ANSI form of the same reconcile
    pub fn merge_sql(&self, target: &str, source: &str) -> String {
        let (columns, values) = self.insert_lists();
        format!(
            "MERGE INTO {target} AS {tgt}\nUSING {source} AS {src}\n  ON {join}\nWHEN MATCHED AND {changed} THEN UPDATE SET\n    {set}\nWHEN NOT MATCHED THEN INSERT ({columns})\n  VALUES ({values})",
            target = quote_ident(target),
            tgt = TARGET_ALIAS,
            source = quote_ident(source),
            src = SOURCE_ALIAS,
            join = self.join_predicate(),
            changed = self.change_predicate(),
            set = self.set_list(true),
            columns = columns,
            values = values,
        )
    }
}

// ================================================================================================
// Tests
// ================================================================================================

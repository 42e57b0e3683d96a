/*!
# Store Financials Warehouse

Warehouse access for the store financials pipeline.

- [`schema`]: target table layout, DDL and identifier validation
- [`merge`]: the declarative merge used to reconcile a holding table into the target
- [`warehouse`]: the [`Warehouse`] trait the reconciler drives
- [`database`]: [`SqliteWarehouse`], the SQLite implementation of that trait

Every table and column name is validated as a plain identifier before it is interpolated
into SQL. Values always travel as bound parameters.
*/

pub mod database;
pub mod errors;
pub mod merge;
pub mod schema;
pub mod warehouse;

// Re-export main types for convenience
pub use database::{SqliteWarehouse, StoredRow, WarehouseConfig};
pub use errors::{DbError, DbResult};
pub use merge::MergeSpec;
pub use schema::{
    validate_identifier, ColumnDef, ColumnKind, TableLayout, CREATED_AT_COLUMN, UPDATED_AT_COLUMN,
};
pub use warehouse::{MergeCounts, StagedFile, TableNames, Warehouse};

pub use rusqlite::types::Value;

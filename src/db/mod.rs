//! Database access for the importer.
//!
//! - `target`: the transaction seam the importer writes through
//! - `postgres` / `sqlite`: the two backends implementing it
//! - `migration`: schema management for both backends

pub mod migration;
pub mod postgres;
pub mod sqlite;
pub mod target;

pub use migration::{run_migrations, run_sqlite_migrations};
pub use postgres::PgImportTransaction;
pub use sqlite::SqliteImportTransaction;
pub use target::{ImportTarget, ImportTransaction};

//! Schema migrations for the `people` table.
//!
//! Each backend has its own migration directory since the id column is
//! declared differently. Both are applied with SQLx's migrator, which records
//! applied versions and skips them on later runs.

use sqlx::migrate::Migrator;
use sqlx::{PgPool, SqlitePool};

pub static POSTGRES_MIGRATOR: Migrator = sqlx::migrate!("./migrations/postgres");

pub static SQLITE_MIGRATOR: Migrator = sqlx::migrate!("./migrations/sqlite");

/// Bring a PostgreSQL database up to the latest schema.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    log::info!("checking database migration state");
    POSTGRES_MIGRATOR.run(pool).await?;
    log::info!("database migrations up to date");
    Ok(())
}

/// Bring a SQLite database up to the latest schema.
pub async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    log::info!("checking sqlite migration state");
    SQLITE_MIGRATOR.run(pool).await?;
    log::info!("sqlite migrations up to date");
    Ok(())
}

use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use people_import::config::{DatabaseConfig, ImportConfig, UploadConfig};
use people_import::db::{run_migrations, run_sqlite_migrations};
use people_import::upload::Upload;
use people_import::{ImportError, ImportStats, Importer};

#[derive(Parser, Debug)]
#[command(
    name = "people-import",
    about = "Import a people CSV file into the database in one transaction"
)]
struct Args {
    /// CSV file with header `name,surname,initials,age,date_of_birth`.
    file: PathBuf,

    /// Database URL (`postgres://...` or `sqlite://...`). Defaults to `DATABASE_URL`.
    #[arg(long)]
    database_url: Option<String>,

    /// Rows per batch flush. Defaults to `IMPORT_BATCH_SIZE` or 10000.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Abort and roll back after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Reject files with more data rows than this (0 disables the limit).
    #[arg(long)]
    max_rows: Option<usize>,

    /// Apply pending schema migrations before importing.
    #[arg(long)]
    migrate: bool,

    /// Print the import stats as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    people_import::init_logger();

    let args = Args::parse();

    let mut db_config = DatabaseConfig::from_env();
    if let Some(url) = args.database_url.clone() {
        db_config.url = Some(url);
    }
    let Some(database_url) = db_config.url.clone() else {
        writeln!(
            io::stderr(),
            "error: no database configured. Set DATABASE_URL or pass --database-url."
        )?;
        std::process::exit(1);
    };

    let mut config = ImportConfig::from_env();
    if let Some(batch_size) = args.batch_size {
        config = config.with_batch_size(batch_size);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config = config.with_timeout(Duration::from_millis(timeout_ms));
    }
    if let Some(max_rows) = args.max_rows {
        config = config.with_max_rows(Some(max_rows));
    }

    // The importer deletes what it imports, so work on a staged copy.
    let upload_config = UploadConfig::from_env();
    let source = tokio::fs::File::open(&args.file).await.map_err(|err| {
        io::Error::new(err.kind(), format!("cannot open {}: {err}", args.file.display()))
    })?;
    let upload = Upload::stage(source, &upload_config.upload_dir).await?;
    log::info!(
        "staged {} as {}",
        args.file.display(),
        upload.path().display()
    );

    let result = if db_config.is_sqlite() {
        let options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(db_config.max_connections)
            .connect_with(options)
            .await?;
        if args.migrate {
            run_sqlite_migrations(&pool).await?;
        }
        let result = Importer::new(pool.clone(), config)
            .import_upload(Some(upload))
            .await;
        pool.close().await;
        result
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .connect(&database_url)
            .await?;
        if args.migrate {
            run_migrations(&pool).await?;
        }
        let result = Importer::new(pool.clone(), config)
            .import_upload(Some(upload))
            .await;
        pool.close().await;
        result
    };

    match result {
        Ok(stats) => print_stats(&stats, args.json),
        Err(err) => report_failure(&err),
    }
}

fn print_stats(stats: &ImportStats, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
    } else {
        println!(
            "Imported {} of {} rows ({} duplicates skipped, {} batches)",
            stats.accepted(),
            stats.rows_read,
            stats.duplicates,
            stats.batches
        );
    }
    Ok(())
}

fn report_failure(err: &ImportError) -> ! {
    let kind = match err {
        ImportError::NoInputProvided => "no input",
        ImportError::Parse(_) => "parse error",
        ImportError::Commit(_) => "commit error",
        ImportError::Database(_) => "database error",
        ImportError::Timeout(_) => "timeout",
        ImportError::RowLimitExceeded(_) => "row limit",
        ImportError::Io(_) => "upload error",
    };
    let _ = writeln!(io::stderr(), "error ({kind}): {err}. No rows were committed.");
    std::process::exit(exit_code(err));
}

/// 2 when the input was rejected, 1 when the store or the environment failed.
fn exit_code(err: &ImportError) -> i32 {
    if err.is_client_error() { 2 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use people_import::ParseError;

    #[test]
    fn test_exit_code_separates_input_from_store_failures() {
        assert_eq!(exit_code(&ImportError::NoInputProvided), 2);
        assert_eq!(exit_code(&ImportError::Parse(ParseError::header("empty"))), 2);
        assert_eq!(exit_code(&ImportError::RowLimitExceeded(10)), 2);
        assert_eq!(exit_code(&ImportError::Commit(sqlx::Error::PoolClosed)), 1);
        assert_eq!(exit_code(&ImportError::Database(sqlx::Error::PoolClosed)), 1);
        assert_eq!(exit_code(&ImportError::Timeout(Duration::from_secs(1))), 1);
    }
}

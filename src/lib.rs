pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod upload;

pub use error::{ImportError, ParseError, ParseErrorKind};
pub use import::{ImportStats, Importer};
pub use models::Person;

use env_logger::Env;
use std::sync::Once;

static LOGGER: Once = Once::new();

/// Initialise `env_logger` once; `RUST_LOG` overrides the default `info` filter.
pub fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(Env::default().default_filter_or("info,sqlx=warn"))
            .format_timestamp(None)
            .init();
    });
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use crate::models::Person;
    use crate::upload::Upload;
    use sqlx::{PgPool, SqlitePool};
    use std::path::Path;

    pub use database::{SqliteTestDatabase, TestDatabase, TestDatabaseError};

    /// Render people as a CSV upload body with the canonical header.
    pub fn people_csv(people: &[Person]) -> String {
        let mut csv = String::from("name,surname,initials,age,date_of_birth\n");
        for person in people {
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                person.name, person.surname, person.initials, person.age, person.date_of_birth
            ));
        }
        csv
    }

    /// Generate `count` distinct people.
    pub fn sample_people(count: usize) -> Vec<Person> {
        (0..count)
            .map(|i| {
                Person::new(
                    format!("Name{i}"),
                    format!("Surname{i}"),
                    "N",
                    18 + (i % 60) as i32,
                    format!("{:02}/{:02}/19{:02}", 1 + i % 28, 1 + i % 12, 50 + i % 50),
                )
            })
            .collect()
    }

    /// Write `contents` to a new upload artifact under `dir`.
    pub async fn write_upload(dir: &Path, contents: &str) -> Upload {
        Upload::stage(contents.as_bytes(), dir)
            .await
            .expect("upload is staged")
    }

    /// Read back every persisted person in id order.
    pub async fn fetch_people_pg(pool: &PgPool) -> Result<Vec<Person>, sqlx::Error> {
        sqlx::query_as::<_, Person>(
            "SELECT name, surname, initials, age, date_of_birth FROM people ORDER BY id",
        )
        .fetch_all(pool)
        .await
    }

    /// Read back every persisted person in id order.
    pub async fn fetch_people_sqlite(pool: &SqlitePool) -> Result<Vec<Person>, sqlx::Error> {
        sqlx::query_as::<_, Person>(
            "SELECT name, surname, initials, age, date_of_birth FROM people ORDER BY id",
        )
        .fetch_all(pool)
        .await
    }

    pub mod database {
        use crate::db::migration::{POSTGRES_MIGRATOR, SQLITE_MIGRATOR};
        use log::LevelFilter;
        use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
        use sqlx::{ConnectOptions, PgPool, SqlitePool};
        use tempfile::TempDir;
        use testcontainers::{GenericImage, ImageExt, core::WaitFor};
        use testcontainers_modules::testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use thiserror::Error;
        use tokio::runtime::Handle;
        use uuid::Uuid;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
            #[error("io error: {0}")]
            Io(#[from] std::io::Error),
        }

        /// Ephemeral PostgreSQL database for integration tests.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            admin_options: PgConnectOptions,
            database_name: String,
            container: Option<ContainerAsync<GenericImage>>,
        }

        impl TestDatabase {
            /// Provision a fresh database by launching a disposable Postgres container.
            pub async fn new() -> Result<Self, TestDatabaseError> {
                let image = GenericImage::new("postgres", "16-alpine")
                    .with_wait_for(WaitFor::message_on_stderr(
                        "database system is ready to accept connections",
                    ));

                let request = image
                    .with_env_var("POSTGRES_DB", "postgres")
                    .with_env_var("POSTGRES_USER", "postgres")
                    .with_env_var("POSTGRES_PASSWORD", "postgres");

                let container = request.start().await?;

                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let admin_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

                let base_options: PgConnectOptions =
                    admin_url.parse().map_err(TestDatabaseError::Sqlx)?;
                let base_options = base_options.log_statements(LevelFilter::Off);

                let admin_options = base_options.clone().database("postgres");
                let admin_pool = connect_with_retry(admin_options.clone()).await?;

                let new_db_name = format!("people_{}", Uuid::new_v4().simple());
                let create_sql = format!("CREATE DATABASE \"{}\" TEMPLATE template0", new_db_name);
                sqlx::query(&create_sql)
                    .execute(&admin_pool)
                    .await
                    .map_err(TestDatabaseError::Sqlx)?;
                admin_pool.close().await;

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(base_options.clone().database(&new_db_name))
                    .await
                    .map_err(TestDatabaseError::Sqlx)?;

                POSTGRES_MIGRATOR.run(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    admin_options,
                    database_name: new_db_name,
                    container: Some(container),
                })
            }

            /// Cloneable connection pool for use in tests.
            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            /// Convenience method returning a clone of the pooled connection handle.
            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Close pool connections and drop the ephemeral database.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }

                drop_database(self.admin_options.clone(), &self.database_name)
                    .await
                    .map_err(TestDatabaseError::Sqlx)?;

                if let Some(container) = self.container.take() {
                    drop(container);
                }

                Ok(())
            }
        }

        /// The server may log readiness once during initdb before the final
        /// restart, so the first connection attempts can be refused.
        async fn connect_with_retry(options: PgConnectOptions) -> Result<PgPool, sqlx::Error> {
            let mut attempts = 0;
            loop {
                match PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(options.clone())
                    .await
                {
                    Ok(pool) => return Ok(pool),
                    Err(err) if attempts < 20 => {
                        attempts += 1;
                        log::debug!("postgres not ready ({}), retrying", err);
                        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        async fn drop_database(
            admin_options: PgConnectOptions,
            database_name: &str,
        ) -> Result<(), sqlx::Error> {
            let admin_pool = PgPoolOptions::new()
                .max_connections(1)
                .connect_with(admin_options)
                .await?;

            let drop_sql = format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", database_name);
            sqlx::query(&drop_sql).execute(&admin_pool).await?;
            Ok(())
        }

        impl Drop for TestDatabase {
            fn drop(&mut self) {
                if let Some(pool) = self.pool.take() {
                    let admin_options = self.admin_options.clone();
                    let db_name = self.database_name.clone();
                    if let Ok(handle) = Handle::try_current() {
                        handle.spawn(async move {
                            pool.close().await;
                            let _ = drop_database(admin_options, &db_name).await;
                        });
                    }
                }

                if let Some(container) = self.container.take() {
                    drop(container);
                }
            }
        }

        /// File-backed SQLite database in a temporary directory, migrated and
        /// removed together with the directory.
        pub struct SqliteTestDatabase {
            pool: SqlitePool,
            dir: TempDir,
        }

        impl SqliteTestDatabase {
            pub async fn new() -> Result<Self, TestDatabaseError> {
                let dir = tempfile::tempdir()?;
                let options = SqliteConnectOptions::new()
                    .filename(dir.path().join("people.db"))
                    .create_if_missing(true);

                let pool = SqlitePoolOptions::new()
                    .max_connections(4)
                    .connect_with(options)
                    .await?;

                SQLITE_MIGRATOR.run(&pool).await?;

                Ok(Self { pool, dir })
            }

            pub fn pool(&self) -> &SqlitePool {
                &self.pool
            }

            pub fn pool_clone(&self) -> SqlitePool {
                self.pool.clone()
            }

            /// Directory owned by this database; handy for staging uploads.
            pub fn dir(&self) -> &std::path::Path {
                self.dir.path()
            }
        }
    }
}

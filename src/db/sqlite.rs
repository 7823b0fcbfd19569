//! SQLite import target.
//!
//! SQLite has no array binds, so each row is its own statement. The statement
//! is prepared once and reused from the connection's statement cache.

use crate::db::target::{ImportTarget, ImportTransaction};
use crate::models::Person;
use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};

const INSERT_PERSON: &str = r#"INSERT INTO people (name, surname, initials, age, date_of_birth)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT (name, surname, date_of_birth) DO NOTHING"#;

/// Open transaction on a SQLite pool.
pub struct SqliteImportTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl ImportTarget for SqlitePool {
    type Transaction = SqliteImportTransaction;

    async fn begin(&self) -> Result<Self::Transaction, sqlx::Error> {
        let tx = SqlitePool::begin(self).await?;
        Ok(SqliteImportTransaction { tx })
    }
}

#[async_trait]
impl ImportTransaction for SqliteImportTransaction {
    async fn insert_batch(&mut self, batch: &[Person]) -> Result<u64, sqlx::Error> {
        let mut inserted = 0;

        for person in batch {
            let result = sqlx::query(INSERT_PERSON)
                .bind(&person.name)
                .bind(&person.surname)
                .bind(&person.initials)
                .bind(person.age)
                .bind(&person.date_of_birth)
                .execute(&mut *self.tx)
                .await?;
            inserted += result.rows_affected();
        }

        log::trace!("inserted {} of {} people", inserted, batch.len());
        Ok(inserted)
    }

    async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}

//! PostgreSQL import target.
//!
//! Batches are written with a single `UNNEST` insert per flush, so a batch of
//! 10,000 rows costs one round trip instead of 10,000.

use crate::db::target::{ImportTarget, ImportTransaction};
use crate::models::Person;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

/// Open transaction on a PostgreSQL pool.
pub struct PgImportTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ImportTarget for PgPool {
    type Transaction = PgImportTransaction;

    async fn begin(&self) -> Result<Self::Transaction, sqlx::Error> {
        let tx = PgPool::begin(self).await?;
        Ok(PgImportTransaction { tx })
    }
}

#[async_trait]
impl ImportTransaction for PgImportTransaction {
    async fn insert_batch(&mut self, batch: &[Person]) -> Result<u64, sqlx::Error> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut names = Vec::with_capacity(batch.len());
        let mut surnames = Vec::with_capacity(batch.len());
        let mut initials = Vec::with_capacity(batch.len());
        let mut ages = Vec::with_capacity(batch.len());
        let mut dates_of_birth = Vec::with_capacity(batch.len());

        for person in batch {
            names.push(person.name.clone());
            surnames.push(person.surname.clone());
            initials.push(person.initials.clone());
            ages.push(person.age);
            dates_of_birth.push(person.date_of_birth.clone());
        }

        let result = sqlx::query(
            r#"INSERT INTO people (name, surname, initials, age, date_of_birth)
               SELECT name, surname, initials, age, date_of_birth
               FROM UNNEST($1::text[], $2::text[], $3::text[], $4::int[], $5::text[])
                   AS t(name, surname, initials, age, date_of_birth)
               ON CONFLICT (name, surname, date_of_birth) DO NOTHING"#,
        )
        .bind(&names)
        .bind(&surnames)
        .bind(&initials)
        .bind(&ages)
        .bind(&dates_of_birth)
        .execute(&mut *self.tx)
        .await?;

        log::trace!(
            "bulk inserted {} of {} people",
            result.rows_affected(),
            batch.len()
        );
        Ok(result.rows_affected())
    }

    async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}

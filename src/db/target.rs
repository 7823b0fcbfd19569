//! Storage seam used by the importer.
//!
//! An [`ImportTarget`] opens one [`ImportTransaction`] per run. The transaction
//! accepts batches of people with insert-or-ignore semantics on the
//! `(name, surname, date_of_birth)` triple and is either committed or rolled
//! back as a whole.

use crate::models::Person;
use async_trait::async_trait;

/// A store the importer can open a write transaction on.
#[async_trait]
pub trait ImportTarget: Send + Sync {
    type Transaction: ImportTransaction;

    /// Begin the transaction that will hold every row of one import run.
    async fn begin(&self) -> Result<Self::Transaction, sqlx::Error>;
}

/// An open write transaction against the `people` table.
#[async_trait]
pub trait ImportTransaction: Send + Sized {
    /// Insert a batch, skipping rows whose uniqueness triple already exists.
    ///
    /// Returns the number of rows actually inserted.
    async fn insert_batch(&mut self, batch: &[Person]) -> Result<u64, sqlx::Error>;

    async fn commit(self) -> Result<(), sqlx::Error>;

    async fn rollback(self) -> Result<(), sqlx::Error>;
}

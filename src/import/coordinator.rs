//! Import coordination for CSV uploads.
//!
//! The Importer drives one run end to end:
//! 1. Read and validate the header
//! 2. Begin the transaction
//! 3. Pull rows into the batch, flushing each time it fills
//! 4. Flush the partial tail batch
//! 5. Commit, or roll back on any failure before the commit

use crate::config::{ImportConfig, MAX_IMPORT_TIMEOUT};
use crate::db::{ImportTarget, ImportTransaction};
use crate::error::ImportError;
use crate::import::batch::Batch;
use crate::import::reader::PersonReader;
use crate::import::stats::ImportStats;
use crate::upload::Upload;
use tokio::io::{AsyncRead, BufReader};
use tokio::time::{Instant, timeout_at};

/// Streams CSV uploads into an [`ImportTarget`].
pub struct Importer<T> {
    target: T,
    config: ImportConfig,
}

impl<T: ImportTarget> Importer<T> {
    /// Create an importer writing to `target`.
    ///
    /// # Arguments
    /// * `target` - Store to open the import transaction on
    /// * `config` - Batch size, timeout and row limit
    pub fn new(target: T, config: ImportConfig) -> Self {
        Self { target, config }
    }

    /// Import a staged upload and delete it afterwards.
    ///
    /// The upload is removed on every path out of this function, including
    /// parse and commit failures.
    pub async fn import_upload(&self, upload: Option<Upload>) -> Result<ImportStats, ImportError> {
        let upload = upload.ok_or(ImportError::NoInputProvided)?;

        let result = match tokio::fs::File::open(upload.path()).await {
            Ok(file) => self.import_reader(BufReader::new(file)).await,
            Err(err) => Err(ImportError::Io(err)),
        };

        upload.remove();
        result
    }

    /// Import every row of `reader` inside one transaction.
    ///
    /// # Returns
    /// Stats for the run; `accepted()` is the number of rows inserted. Rows whose
    /// `(name, surname, date_of_birth)` already existed count as duplicates.
    pub async fn import_reader<R>(&self, reader: R) -> Result<ImportStats, ImportError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let deadline = self.deadline();

        let mut reader = match timeout_at(deadline, PersonReader::new(reader)).await {
            Ok(reader) => reader?,
            Err(_) => return Err(ImportError::Timeout(self.config.import_timeout)),
        };

        let mut tx = self.target.begin().await?;
        log::info!(
            "import started (batch size {}, timeout {:?})",
            self.config.batch_size,
            self.config.import_timeout
        );

        let loaded = match timeout_at(deadline, self.load(&mut reader, &mut tx)).await {
            Ok(result) => result,
            Err(_) => Err(ImportError::Timeout(self.config.import_timeout)),
        };

        let stats = match loaded {
            Ok(stats) => stats,
            Err(err) => {
                log::warn!("import failed, rolling back: {}", err);
                if let Err(rollback_err) = tx.rollback().await {
                    log::error!("rollback failed: {}", rollback_err);
                }
                return Err(err);
            }
        };

        if let Err(err) = tx.commit().await {
            log::error!("import commit failed: {}", err);
            return Err(ImportError::Commit(err));
        }

        log::info!(
            "import complete: {} rows read, {} inserted, {} duplicates, {} batches",
            stats.rows_read,
            stats.inserted,
            stats.duplicates,
            stats.batches
        );
        Ok(stats)
    }

    /// Deadline for a run starting now. Timeouts past what `Instant` can
    /// represent fall back to `MAX_IMPORT_TIMEOUT`.
    fn deadline(&self) -> Instant {
        let now = Instant::now();
        now.checked_add(self.config.import_timeout)
            .or_else(|| now.checked_add(MAX_IMPORT_TIMEOUT))
            .unwrap_or(now)
    }

    async fn load<R>(
        &self,
        reader: &mut PersonReader<R>,
        tx: &mut T::Transaction,
    ) -> Result<ImportStats, ImportError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut batch = Batch::with_capacity(self.config.batch_size);
        let mut stats = ImportStats::default();

        while let Some(person) = reader.next_record().await? {
            stats.rows_read += 1;
            if let Some(limit) = self.config.max_rows {
                if stats.rows_read > limit {
                    return Err(ImportError::RowLimitExceeded(limit));
                }
            }

            if batch.push(person) {
                Self::flush(&mut batch, tx, &mut stats).await?;
            }
        }

        Self::flush(&mut batch, tx, &mut stats).await?;
        Ok(stats)
    }

    async fn flush(
        batch: &mut Batch,
        tx: &mut T::Transaction,
        stats: &mut ImportStats,
    ) -> Result<(), ImportError> {
        if batch.is_empty() {
            return Ok(());
        }

        let inserted = tx.insert_batch(batch.as_slice()).await?;
        stats.record_batch(batch.len(), inserted);

        log::debug!(
            "flushed batch {}: {} rows, {} inserted",
            stats.batches,
            batch.len(),
            inserted
        );

        batch.clear();
        Ok(())
    }
}

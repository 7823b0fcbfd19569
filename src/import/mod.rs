//! Bulk CSV import of people.
//!
//! This module turns an uploaded CSV stream into rows of the `people` table:
//!
//! 1. **Decoding** (`reader`) - Validates the header and yields typed `Person` rows on demand
//! 2. **Buffering** (`batch`) - Holds up to `batch_size` rows between flushes
//! 3. **Coordination** (`coordinator`) - Owns the transaction, flushes batches, commits or rolls back
//! 4. **Statistics** (`stats`) - Counts rows read, inserted and skipped as duplicates
//!
//! # Guarantees
//!
//! A run is all-or-nothing: every batch is written into one transaction that is
//! only committed after the last row was read and flushed. Rows that collide on
//! `(name, surname, date_of_birth)` are skipped, not rejected, and are reported
//! as duplicates rather than accepted rows.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use people_import::config::ImportConfig;
//! use people_import::import::Importer;
//! use people_import::upload::Upload;
//!
//! let importer = Importer::new(pool, ImportConfig::from_env());
//! let stats = importer.import_upload(Some(Upload::adopt(path))).await?;
//!
//! println!("Imported {} people", stats.accepted());
//! ```

pub mod batch;
pub mod coordinator;
pub mod reader;
pub mod stats;

// Re-export main types
pub use batch::Batch;
pub use coordinator::Importer;
pub use reader::PersonReader;
pub use stats::ImportStats;

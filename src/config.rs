use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default number of rows buffered before a batch is flushed.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Default upper bound on the duration of one import run.
pub const DEFAULT_IMPORT_TIMEOUT_MS: u64 = 600_000;

/// Longest timeout accepted; larger values are clamped to it.
pub const MAX_IMPORT_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_duration_millis(key: &str, default_millis: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or_else(|| Duration::from_millis(default_millis))
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or(default)
}

/// Runtime configuration for a CSV import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Rows buffered before a flush. Never zero.
    pub batch_size: usize,
    /// Upper bound on reading and flushing, from the header to the last batch.
    pub import_timeout: Duration,
    /// Maximum number of data rows accepted from one stream.
    pub max_rows: Option<usize>,
}

impl ImportConfig {
    pub fn from_env() -> Self {
        let max_rows = env_usize("IMPORT_MAX_ROWS", 0);

        Self {
            batch_size: env_usize("IMPORT_BATCH_SIZE", DEFAULT_BATCH_SIZE).max(1),
            import_timeout: env_duration_millis("IMPORT_TIMEOUT_MS", DEFAULT_IMPORT_TIMEOUT_MS)
                .min(MAX_IMPORT_TIMEOUT),
            max_rows: (max_rows > 0).then_some(max_rows),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.import_timeout = timeout.min(MAX_IMPORT_TIMEOUT);
        self
    }

    pub fn with_max_rows(mut self, max_rows: Option<usize>) -> Self {
        self.max_rows = max_rows.filter(|limit| *limit > 0);
        self
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Where staged uploads are written before they are imported.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub upload_dir: PathBuf,
}

impl UploadConfig {
    pub fn from_env() -> Self {
        Self {
            upload_dir: env_path("UPLOAD_DIR", env::temp_dir()),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Connection settings for the target database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            max_connections: env_u32("DATABASE_MAX_CONNECTIONS", 5).max(1),
        }
    }

    /// True when the URL selects the SQLite backend.
    pub fn is_sqlite(&self) -> bool {
        self.url
            .as_deref()
            .map(|url| url.starts_with("sqlite:"))
            .unwrap_or(false)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explicit() -> ImportConfig {
        ImportConfig {
            batch_size: DEFAULT_BATCH_SIZE,
            import_timeout: Duration::from_millis(DEFAULT_IMPORT_TIMEOUT_MS),
            max_rows: None,
        }
    }

    #[test]
    fn test_batch_size_never_zero() {
        let config = explicit().with_batch_size(0);
        assert_eq!(config.batch_size, 1);

        let config = explicit().with_batch_size(250);
        assert_eq!(config.batch_size, 250);
    }

    #[test]
    fn test_zero_row_limit_means_unbounded() {
        assert_eq!(explicit().with_max_rows(Some(0)).max_rows, None);
        assert_eq!(explicit().with_max_rows(Some(30)).max_rows, Some(30));
    }

    #[test]
    fn test_timeout_is_clamped() {
        let config = explicit().with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(config.import_timeout, MAX_IMPORT_TIMEOUT);
    }

    #[test]
    fn test_sqlite_url_detection() {
        let sqlite = DatabaseConfig {
            url: Some("sqlite://people.db".to_string()),
            max_connections: 1,
        };
        assert!(sqlite.is_sqlite());

        let postgres = DatabaseConfig {
            url: Some("postgres://localhost/people".to_string()),
            max_connections: 1,
        };
        assert!(!postgres.is_sqlite());
    }
}

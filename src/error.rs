use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Reasons a CSV stream could not be turned into `Person` records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Header row does not name exactly the expected columns.
    Header(String),
    /// A data row has a different number of fields than the header.
    FieldCount { expected: usize, found: usize },
    /// `age` is not an integer.
    InvalidAge(String),
    /// Malformed CSV or an I/O failure while reading the stream.
    Malformed(String),
}

/// A parse failure, located at the 1-based CSV line when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: Option<u64>,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: Option<u64>, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }

    pub fn header(reason: impl Into<String>) -> Self {
        Self::new(Some(1), ParseErrorKind::Header(reason.into()))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(line) = self.line {
            write!(f, "line {}: ", line)?;
        }
        match &self.kind {
            ParseErrorKind::Header(reason) => write!(f, "invalid header: {}", reason),
            ParseErrorKind::FieldCount { expected, found } => {
                write!(f, "expected {} fields, found {}", expected, found)
            }
            ParseErrorKind::InvalidAge(value) => write!(f, "age '{}' is not an integer", value),
            ParseErrorKind::Malformed(reason) => write!(f, "malformed csv: {}", reason),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<csv_async::Error> for ParseError {
    fn from(err: csv_async::Error) -> Self {
        match err.kind() {
            csv_async::ErrorKind::UnequalLengths {
                pos,
                expected_len,
                len,
            } => Self::new(
                pos.as_ref().map(|pos| pos.line()),
                ParseErrorKind::FieldCount {
                    expected: *expected_len as usize,
                    found: *len as usize,
                },
            ),
            _ => Self::new(None, ParseErrorKind::Malformed(err.to_string())),
        }
    }
}

/// Errors returned by an import run.
///
/// Every variant except `NoInputProvided`, `Io` and `Commit` is raised while the
/// transaction is open and causes it to be rolled back.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("no input provided")]
    NoInputProvided,
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("commit failed: {0}")]
    Commit(sqlx::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("import timed out after {0:?}")]
    Timeout(Duration),
    #[error("row limit of {0} exceeded")]
    RowLimitExceeded(usize),
    #[error("upload error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// True when the failure came from the input rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ImportError::NoInputProvided
                | ImportError::Parse(_)
                | ImportError::RowLimitExceeded(_)
        )
    }
}

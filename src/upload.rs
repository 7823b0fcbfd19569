//! Temporary upload artifacts.
//!
//! An [`Upload`] owns a file on disk that exists only to be imported. The file
//! is deleted when the upload is removed or dropped, whichever comes first.

use std::io;
use std::path::Path;
use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncWriteExt};

/// A staged CSV file awaiting import.
#[derive(Debug)]
pub struct Upload {
    path: TempPath,
}

impl Upload {
    /// Take ownership of an already written temporary file.
    pub fn adopt(path: impl AsRef<Path>) -> Self {
        Self {
            path: TempPath::from_path(path.as_ref()),
        }
    }

    /// Copy a byte stream into a fresh file under `dir`.
    ///
    /// If the copy fails the partial file is removed before returning.
    pub async fn stage<R>(mut reader: R, dir: &Path) -> io::Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".csv")
            .tempfile_in(dir)?;
        let (file, path) = file.into_parts();

        let mut out = tokio::fs::File::from_std(file);
        let bytes = tokio::io::copy(&mut reader, &mut out).await?;
        out.flush().await?;

        log::debug!("staged upload {} ({} bytes)", path.display(), bytes);
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the artifact. An already missing file counts as removed.
    pub fn remove(self) {
        let display = self.path.display().to_string();
        match self.path.close() {
            Ok(()) => log::debug!("removed upload {}", display),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("upload {} already removed", display)
            }
            Err(err) => log::warn!("failed to remove upload {}: {}", display, err),
        }
    }
}

//! Local filesystem storage implementation.
//!
//! Keeps the marker in a single text file, written without a trailing
//! newline. A hand-edited file ending in a line break still compares equal.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::MarkerStore;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Create a LocalStorage backed by the given marker file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read the file, returning None if it doesn't exist.
    async fn read_string(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl MarkerStore for LocalStorage {
    async fn read_marker(&self) -> Result<Option<String>> {
        match self.read_string().await? {
            Some(content) => Ok(Some(content.trim_end_matches(['\r', '\n']).to_string())),
            None => {
                log::warn!("No marker found at {}", self.path.display());
                Ok(None)
            }
        }
    }

    async fn write_marker(&self, marker: &str) -> Result<()> {
        self.write_bytes(marker.as_bytes()).await?;
        log::info!("Marker {} written to {}", marker, self.path.display());
        Ok(())
    }
}

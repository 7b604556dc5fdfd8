//! In-memory storage implementation.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::storage::MarkerStore;

/// Marker store that lives for one process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    marker: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a marker.
    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            marker: Mutex::new(Some(marker.into())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A poisoned lock still holds a valid Option
        self.marker.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl MarkerStore for MemoryStorage {
    async fn read_marker(&self) -> Result<Option<String>> {
        Ok(self.lock().clone())
    }

    async fn write_marker(&self, marker: &str) -> Result<()> {
        *self.lock() = Some(marker.to_string());
        Ok(())
    }
}

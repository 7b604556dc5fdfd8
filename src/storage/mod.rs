//! Storage abstractions for the processed-bulletin marker.
//!
//! The marker is the href tail of the last bulletin that was published. It is
//! read once when a run starts and written once after a successful post.
//!
//! ## Backings
//!
//! ```text
//! LocalStorage   ./PreviousHrefData.text        (CLI)
//! S3Storage      s3://{bucket}/{prefix}/{key}   (Lambda, feature "s3")
//! MemoryStorage  in-process                     (tests, dry runs)
//! ```

pub mod local;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

/// Trait for marker storage backends.
#[async_trait]
pub trait MarkerStore: Send + Sync {
    /// Read the stored marker, `None` if nothing has been stored yet.
    async fn read_marker(&self) -> Result<Option<String>>;

    /// Replace the stored marker.
    async fn write_marker(&self, marker: &str) -> Result<()>;
}

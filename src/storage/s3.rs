//! AWS S3 storage implementation.
//!
//! Keeps the marker as a small text object at `{bucket}/{prefix}/{key}` so a
//! scheduled Lambda can remember the last bulletin between invocations.

use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::storage::MarkerStore;

/// S3-based marker storage.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    key: String,
}

impl S3Storage {
    /// Create a new S3 storage instance.
    pub fn new(client: Client, bucket: impl Into<String>, prefix: &str, key: &str) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            key: object_key(prefix, key),
        }
    }

    /// Create S3 storage from environment configuration.
    pub async fn from_env(key: &str) -> Result<Self> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);

        let bucket = std::env::var("S3_BUCKET")
            .map_err(|_| AppError::config("S3_BUCKET is not set"))?;
        let prefix = std::env::var("S3_PREFIX").unwrap_or_else(|_| "bulletin".to_string());

        Ok(Self::new(client, bucket, &prefix, key))
    }

    /// Location string for log output.
    pub fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

fn object_key(prefix: &str, key: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", prefix, key)
    }
}

#[async_trait]
impl MarkerStore for S3Storage {
    async fn read_marker(&self) -> Result<Option<String>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::S3(e.to_string()))?;
                let marker = String::from_utf8(bytes.into_bytes().to_vec())
                    .map_err(|e| AppError::S3(format!("marker is not valid UTF-8: {e}")))?;
                Ok(Some(marker.trim_end_matches(['\r', '\n']).to_string()))
            }
            Err(err) => {
                // Check if it's a "not found" error
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::warn!("No marker found at {}", self.location());
                    Ok(None)
                } else {
                    Err(AppError::S3(service_err.to_string()))
                }
            }
        }
    }

    async fn write_marker(&self, marker: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .body(ByteStream::from(marker.as_bytes().to_vec()))
            .content_type("text/plain; charset=utf-8")
            .send()
            .await
            .map_err(|e| AppError::S3(e.to_string()))?;

        log::info!("Marker {} written to {}", marker, self.location());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key() {
        assert_eq!(object_key("bulletin", "PreviousHrefData.text"), "bulletin/PreviousHrefData.text");
        assert_eq!(object_key("/bulletin/", "m"), "bulletin/m");
        assert_eq!(object_key("", "m"), "m");
    }
}

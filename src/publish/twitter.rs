// src/publish/twitter.rs

//! Twitter/X publisher: media upload followed by a post with the media
//! attached. Requests are signed with OAuth 1.0a user credentials.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;

use super::oauth::{Credentials, authorization_header};
use super::{PublishReceipt, Publisher};
use crate::error::{AppError, Result};
use crate::models::PublishConfig;

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
}

pub struct TwitterPublisher {
    client: reqwest::Client,
    /// Read from the environment at publish time when unset
    credentials: Option<Credentials>,
    upload_url: String,
    status_url: String,
}

impl TwitterPublisher {
    pub fn new(client: reqwest::Client, credentials: Credentials, config: &PublishConfig) -> Self {
        Self {
            client,
            credentials: Some(credentials),
            upload_url: config.upload_url.clone(),
            status_url: config.status_url.clone(),
        }
    }

    /// Build a publisher that reads credentials from the environment when it
    /// first has something to post.
    pub fn from_env(client: reqwest::Client, config: &PublishConfig) -> Self {
        Self {
            client,
            credentials: None,
            upload_url: config.upload_url.clone(),
            status_url: config.status_url.clone(),
        }
    }

    fn credentials(&self) -> Result<Credentials> {
        match &self.credentials {
            Some(credentials) => Ok(credentials.clone()),
            None => Credentials::from_env(),
        }
    }

    async fn upload_media(&self, credentials: &Credentials, image: &Path) -> Result<String> {
        let bytes = tokio::fs::read(image).await?;
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.png".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/png")?;
        let form = Form::new().part("media", part);

        let auth = authorization_header("POST", &self.upload_url, &[], credentials);
        let response = self
            .client
            .post(&self.upload_url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .multipart(form)
            .send()
            .await?;

        let body: MediaUploadResponse = read_json(response, "media upload").await?;
        log::debug!("Uploaded {} as media {}", image.display(), body.media_id_string);
        Ok(body.media_id_string)
    }

    async fn create_post(
        &self,
        credentials: &Credentials,
        caption: &str,
        media_id: &str,
    ) -> Result<String> {
        let payload = json!({
            "text": caption,
            "media": { "media_ids": [media_id] },
        });

        let auth = authorization_header("POST", &self.status_url, &[], credentials);
        let response = self
            .client
            .post(&self.status_url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&payload)
            .send()
            .await?;

        let body: PostResponse = read_json(response, "post").await?;
        Ok(body.data.id)
    }
}

#[async_trait]
impl Publisher for TwitterPublisher {
    async fn publish(&self, image: &Path, caption: &str) -> Result<PublishReceipt> {
        let credentials = self.credentials()?;
        let media_id = self.upload_media(&credentials, image).await?;
        let post_id = self.create_post(&credentials, caption, &media_id).await?;
        log::info!("Published post {} with media {}", post_id, media_id);
        Ok(PublishReceipt { media_id, post_id })
    }
}

/// Deserialize a 2xx body; anything else becomes a publish error.
async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    stage: &str,
) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(AppError::publish(stage, format!("{status}: {text}")));
    }

    serde_json::from_str(&text).map_err(|e| AppError::publish(stage, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_shape() {
        let body: MediaUploadResponse = serde_json::from_str(
            r#"{"media_id":1474000000000000000,"media_id_string":"1474000000000000000","size":1024}"#,
        )
        .unwrap();
        assert_eq!(body.media_id_string, "1474000000000000000");
    }

    #[test]
    fn test_post_response_shape() {
        let body: PostResponse =
            serde_json::from_str(r#"{"data":{"id":"1475","text":"hello"}}"#).unwrap();
        assert_eq!(body.data.id, "1475");
    }

    #[test]
    fn test_publisher_uses_configured_endpoints() {
        let credentials = Credentials::from_lookup(|_| Some("x".to_string())).unwrap();
        let mut config = PublishConfig::default();
        config.status_url = "https://example.test/2/tweets".to_string();

        let publisher = TwitterPublisher::new(reqwest::Client::new(), credentials, &config);
        assert!(publisher.credentials().is_ok());
        assert_eq!(publisher.status_url, "https://example.test/2/tweets");
        assert_eq!(
            publisher.upload_url,
            "https://upload.twitter.com/1.1/media/upload.json"
        );
    }
}

//! HTTP media fetcher
//!
//! Relative media paths (`/upload/...`) are joined onto a configured base
//! URL. A `file://` base serves media from a local directory instead.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use url::Url;

use crate::ports::outbound::{MediaError, MediaFetchPort};

/// Refuse media bodies larger than this.
pub const MAX_MEDIA_BYTES: usize = 64 * 1024 * 1024;

#[derive(Clone)]
pub struct HttpMediaFetcher {
    client: Client,
    base_url: Option<Url>,
}

impl HttpMediaFetcher {
    pub fn new(base_url: Option<Url>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, base_url }
    }

    /// Absolute URL for a media reference.
    pub fn resolve(&self, reference: &str) -> Result<Url, MediaError> {
        let reference = reference.trim();
        if let Ok(absolute) = Url::parse(reference) {
            return Ok(absolute);
        }
        let base = self
            .base_url
            .as_ref()
            .ok_or_else(|| MediaError::InvalidUrl(reference.to_string()))?;
        base.join(reference.trim_start_matches('/'))
            .map_err(|_| MediaError::InvalidUrl(reference.to_string()))
    }

    async fn fetch_file(&self, url: &Url) -> Result<Vec<u8>, MediaError> {
        let path = url
            .to_file_path()
            .map_err(|_| MediaError::InvalidUrl(url.to_string()))?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| MediaError::transport(url.as_str(), e))
    }

    async fn fetch_http(&self, url: &Url) -> Result<Vec<u8>, MediaError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| MediaError::transport(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| MediaError::transport(url.as_str(), e))?;
            if body.len() + chunk.len() > MAX_MEDIA_BYTES {
                return Err(MediaError::transport(url.as_str(), "media body too large"));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

impl Default for HttpMediaFetcher {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl MediaFetchPort for HttpMediaFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        let resolved = self.resolve(url)?;
        tracing::debug!(url = %url, resolved = %resolved, "Fetching media");
        match resolved.scheme() {
            "file" => self.fetch_file(&resolved).await,
            "http" | "https" => self.fetch_http(&resolved).await,
            _ => Err(MediaError::InvalidUrl(url.to_string())),
        }
    }
}

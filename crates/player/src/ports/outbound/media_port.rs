//! Media ports - fetching bytes and turning them into playable object URLs

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by media adapters.
///
/// None of these reach the player: the audio engine records them as a track
/// or preload status and logs them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid media URL: {0}")]
    InvalidUrl(String),

    #[error("Element has no source")]
    NoSource,

    #[error("Playback blocked: {0}")]
    PlaybackBlocked(String),
}

impl MediaError {
    pub fn transport(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

/// Fetches raw media bytes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaFetchPort: Send + Sync {
    /// Fetch `url`. A non-success response status is an error.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError>;
}

/// Creates and revokes object URLs for fetched media.
#[cfg_attr(test, mockall::automock)]
pub trait ObjectUrlPort: Send + Sync {
    /// Register `bytes` and return a URL an audio element can play.
    fn create(&self, bytes: Vec<u8>) -> String;

    /// Release the bytes behind `object_url`. Unknown URLs are ignored.
    fn revoke(&self, object_url: &str);
}

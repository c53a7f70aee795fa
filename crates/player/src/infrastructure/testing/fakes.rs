//! Configurable in-memory media fetcher.
//!
//! Note: mockall expectations cannot express "resolve after a delay", which
//! the audio engine tests rely on to interleave requests, hence a hand-rolled
//! fake here.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::outbound::{MediaError, MediaFetchPort};

#[derive(Debug, Clone)]
enum Response {
    Bytes(Vec<u8>),
    Status(u16),
}

/// Serves canned responses per URL; unknown URLs answer 404.
#[derive(Default)]
pub struct FakeMediaFetcher {
    responses: HashMap<String, Response>,
    delays: HashMap<String, Duration>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeMediaFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), Response::Bytes(bytes));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses.insert(url.to_string(), Response::Status(status));
        self
    }

    /// Delay the response for `url` on the tokio clock.
    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    /// How many times `url` was fetched.
    pub fn calls(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl MediaFetchPort for FakeMediaFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        *self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(url.to_string())
            .or_default() += 1;

        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }

        match self.responses.get(url) {
            Some(Response::Bytes(bytes)) => Ok(bytes.clone()),
            Some(Response::Status(status)) => Err(MediaError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(MediaError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_canned_responses_and_call_counts() {
        let fetcher = FakeMediaFetcher::new()
            .with_bytes("a.mp3", b"a".to_vec())
            .with_status("b.mp3", 500)
            .with_delay("a.mp3", Duration::from_millis(40));

        assert_eq!(fetcher.fetch("a.mp3").await.unwrap(), b"a");
        assert!(matches!(
            fetcher.fetch("b.mp3").await,
            Err(MediaError::Status { status: 500, .. })
        ));
        assert!(matches!(
            fetcher.fetch("c.mp3").await,
            Err(MediaError::Status { status: 404, .. })
        ));
        assert_eq!(fetcher.calls("a.mp3"), 1);
        assert_eq!(fetcher.calls("d.mp3"), 0);
    }
}

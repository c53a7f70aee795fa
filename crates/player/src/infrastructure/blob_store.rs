//! In-memory object URL store
//!
//! Stands in for browser `blob:` URLs: fetched media bytes are held in memory
//! under a generated URL until revoked.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::ports::outbound::ObjectUrlPort;

pub const OBJECT_URL_PREFIX: &str = "blob:storyweb/";

#[derive(Default)]
pub struct BlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn blobs(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bytes behind a live object URL.
    pub fn get(&self, object_url: &str) -> Option<Vec<u8>> {
        self.blobs().get(object_url).cloned()
    }

    pub fn contains(&self, object_url: &str) -> bool {
        self.blobs().contains_key(object_url)
    }

    /// Number of live object URLs.
    pub fn len(&self) -> usize {
        self.blobs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs().is_empty()
    }
}

impl ObjectUrlPort for BlobStore {
    fn create(&self, bytes: Vec<u8>) -> String {
        let object_url = format!("{}{}", OBJECT_URL_PREFIX, Uuid::new_v4());
        self.blobs().insert(object_url.clone(), bytes);
        object_url
    }

    fn revoke(&self, object_url: &str) {
        if self.blobs().remove(object_url).is_none() {
            tracing::debug!(object_url, "Revoking unknown object URL");
        }
    }
}

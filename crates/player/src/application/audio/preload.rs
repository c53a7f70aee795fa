//! Preload cache: resolved object URLs, in-flight fetches and the preload log.

use std::collections::HashMap;

use futures_util::future::{BoxFuture, Shared};

use super::debug::{PreloadEntry, PreloadStatus};

/// A fetch that every concurrent requester of the same URL awaits.
pub(super) type SharedFetch = Shared<BoxFuture<'static, Option<String>>>;

/// Result of preloading one URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct PreloadOutcome {
    pub object_url: Option<String>,
    pub from_cache: bool,
}

impl PreloadOutcome {
    pub fn failed() -> Self {
        Self::default()
    }

    pub fn fetched(object_url: Option<String>) -> Self {
        Self {
            object_url,
            from_cache: false,
        }
    }

    pub fn cached(object_url: Option<String>) -> Self {
        let from_cache = object_url.is_some();
        Self {
            object_url,
            from_cache,
        }
    }
}

/// Per-engine cache state.
///
/// `epoch` changes on every [`PreloadCache::clear`]; fetches started under an
/// older epoch must not write into the cache when they complete.
#[derive(Default)]
pub(super) struct PreloadCache {
    cache: HashMap<String, String>,
    inflight: HashMap<String, SharedFetch>,
    log: Vec<PreloadEntry>,
    epoch: u64,
}

impl PreloadCache {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn cached(&self, url: &str) -> Option<String> {
        self.cache.get(url).cloned()
    }

    pub fn inflight(&self, url: &str) -> Option<SharedFetch> {
        self.inflight.get(url).cloned()
    }

    pub fn begin(&mut self, url: &str, fetch: SharedFetch) {
        self.record(url, PreloadStatus::Pending);
        self.inflight.insert(url.to_string(), fetch);
    }

    /// Upsert the log entry for `url`, keeping its first-request position.
    pub fn record(&mut self, url: &str, status: PreloadStatus) {
        match self.log.iter_mut().find(|entry| entry.url == url) {
            Some(entry) => entry.status = status,
            None => self.log.push(PreloadEntry {
                url: url.to_string(),
                status,
            }),
        }
    }

    /// Like [`PreloadCache::record`], but ignored when the cache was cleared
    /// after `epoch`.
    pub fn record_since(&mut self, url: &str, epoch: u64, status: PreloadStatus) {
        if epoch == self.epoch {
            self.record(url, status);
        }
    }

    /// Store a finished fetch. Returns false when the cache was cleared since
    /// the fetch started; the caller then owns `object_url` and must revoke it.
    pub fn complete_loaded(&mut self, url: &str, epoch: u64, object_url: &str) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.cache.insert(url.to_string(), object_url.to_string());
        self.inflight.remove(url);
        self.record(url, PreloadStatus::Loaded);
        true
    }

    pub fn complete_failed(&mut self, url: &str, epoch: u64) {
        if epoch != self.epoch {
            return;
        }
        self.inflight.remove(url);
        self.record(url, PreloadStatus::Error);
    }

    pub fn entries(&self) -> Vec<PreloadEntry> {
        self.log.clone()
    }

    /// Drop everything and start a new epoch. Returns the object URLs to revoke.
    pub fn clear(&mut self) -> Vec<String> {
        self.epoch += 1;
        self.inflight.clear();
        self.log.clear();
        self.cache.drain().map(|(_, object_url)| object_url).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;

    fn ready(value: Option<&str>) -> SharedFetch {
        let value = value.map(str::to_string);
        async move { value }.boxed().shared()
    }

    #[test]
    fn test_record_keeps_first_request_order() {
        let mut cache = PreloadCache::default();
        cache.record("a", PreloadStatus::Pending);
        cache.record("b", PreloadStatus::Pending);
        cache.record("a", PreloadStatus::Loaded);

        let entries = cache.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "a");
        assert_eq!(entries[0].status, PreloadStatus::Loaded);
        assert_eq!(entries[1].url, "b");
    }

    #[test]
    fn test_complete_loaded_moves_from_inflight_to_cache() {
        let mut cache = PreloadCache::default();
        let epoch = cache.epoch();
        cache.begin("a", ready(Some("blob:1")));
        assert!(cache.inflight("a").is_some());

        assert!(cache.complete_loaded("a", epoch, "blob:1"));
        assert!(cache.inflight("a").is_none());
        assert_eq!(cache.cached("a").as_deref(), Some("blob:1"));
    }

    #[test]
    fn test_stale_epoch_is_rejected() {
        let mut cache = PreloadCache::default();
        let epoch = cache.epoch();
        cache.begin("a", ready(None));
        cache.begin("b", ready(None));

        let revoked = cache.clear();
        assert!(revoked.is_empty());
        assert!(!cache.complete_loaded("a", epoch, "blob:late"));
        cache.complete_failed("b", epoch);

        assert!(cache.cached("a").is_none());
        assert!(cache.entries().is_empty());
    }

    #[test]
    fn test_record_since_ignores_cleared_epoch() {
        let mut cache = PreloadCache::default();
        let epoch = cache.epoch();
        cache.record_since("a", epoch, PreloadStatus::Hit);
        assert_eq!(cache.entries().len(), 1);

        cache.clear();
        cache.record_since("a", epoch, PreloadStatus::Error);
        assert!(cache.entries().is_empty());
    }

    #[test]
    fn test_clear_returns_object_urls() {
        let mut cache = PreloadCache::default();
        let epoch = cache.epoch();
        cache.begin("a", ready(None));
        cache.complete_loaded("a", epoch, "blob:1");

        assert_eq!(cache.clear(), vec!["blob:1".to_string()]);
        assert!(cache.cached("a").is_none());
        assert_ne!(cache.epoch(), epoch);
    }

    #[test]
    fn test_outcome_from_shared_result() {
        assert!(PreloadOutcome::cached(Some("blob:1".into())).from_cache);
        assert!(!PreloadOutcome::cached(None).from_cache);
        assert!(!PreloadOutcome::fetched(Some("blob:1".into())).from_cache);
    }
}

//! Debug snapshot of the audio engine: per-track status and the preload log.

use std::sync::Arc;

use serde::Serialize;

/// Receives a fresh snapshot after every observable change.
pub type DebugListener = Arc<dyn Fn(AudioDebugSnapshot) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    /// Looping background bed
    Main,
    /// Overlay played on top of the bed
    Alt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    #[default]
    Idle,
    /// Probing candidate URLs
    Resolving,
    Playing,
    Paused,
    Stopped,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreloadStatus {
    Pending,
    Loaded,
    Hit,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDebug {
    pub status: TrackStatus,
    pub requested: Option<String>,
    pub resolved: Option<String>,
    pub volume: Option<f64>,
    pub from_cache: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreloadEntry {
    pub url: String,
    pub status: PreloadStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioDebugSnapshot {
    pub main: Option<TrackDebug>,
    pub alt: Option<TrackDebug>,
    /// In first-request order
    pub preload: Vec<PreloadEntry>,
}

impl AudioDebugSnapshot {
    pub fn track(&self, kind: TrackKind) -> Option<&TrackDebug> {
        match kind {
            TrackKind::Main => self.main.as_ref(),
            TrackKind::Alt => self.alt.as_ref(),
        }
    }

    pub fn preload_status(&self, url: &str) -> Option<PreloadStatus> {
        self.preload
            .iter()
            .find(|entry| entry.url == url)
            .map(|entry| entry.status)
    }
}

/// Partial update of a track's debug fields; unset fields keep their value.
#[derive(Debug, Clone, Default)]
pub(crate) struct TrackUpdate {
    requested: Option<Option<String>>,
    resolved: Option<Option<String>>,
    volume: Option<f64>,
    from_cache: Option<bool>,
}

impl TrackUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested(mut self, url: Option<&str>) -> Self {
        self.requested = Some(url.map(str::to_string));
        self
    }

    pub fn resolved(mut self, url: Option<&str>) -> Self {
        self.resolved = Some(url.map(str::to_string));
        self
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn from_cache(mut self, from_cache: bool) -> Self {
        self.from_cache = Some(from_cache);
        self
    }

    pub fn apply(self, status: TrackStatus, track: &mut TrackDebug) {
        track.status = status;
        if let Some(requested) = self.requested {
            track.requested = requested;
        }
        if let Some(resolved) = self.resolved {
            track.resolved = resolved;
        }
        if let Some(volume) = self.volume {
            track.volume = Some(volume);
        }
        if let Some(from_cache) = self.from_cache {
            track.from_cache = Some(from_cache);
        }
    }
}

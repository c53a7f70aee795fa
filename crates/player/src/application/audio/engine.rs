//! Audio Engine - background bed and overlay playback for the player
//!
//! One engine lives for the whole play session. `set_source` is called for
//! every shown node; candidate URLs are preloaded into object URLs, resolved
//! in order and crossfaded in. Every call bumps a request token so that a
//! slow resolution finishing after a newer call is dropped instead of
//! clobbering the current track.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures_util::FutureExt;
use storyweb_domain::{AltBehavior, AudioSourceConfig, NodeId};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::debug::{
    AudioDebugSnapshot, DebugListener, PreloadStatus, TrackDebug, TrackKind, TrackStatus,
    TrackUpdate,
};
use super::fade::{clamp01, spawn_fade};
use super::preload::{PreloadCache, PreloadOutcome, SharedFetch};
use crate::ports::outbound::{AudioElementPort, AudioOutputPort, MediaFetchPort, ObjectUrlPort};

pub const DEFAULT_CROSSFADE_MS: u64 = 350;
/// Fade used when an already started track is brought back to its volume.
const RESUME_FADE_MS: u64 = 120;
/// Fade to silence when sound is switched off.
const MUTE_FADE_MS: u64 = 100;

/// Host conditions that gate playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub sound_enabled: bool,
    /// False until the host has seen a user gesture
    pub can_autoplay: bool,
    pub is_document_visible: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            can_autoplay: false,
            is_document_visible: true,
        }
    }
}

impl PlaybackState {
    /// Visible, autoplay allowed, sound on.
    pub fn unlocked() -> Self {
        Self {
            can_autoplay: true,
            ..Self::default()
        }
    }

    pub fn with_sound(mut self, sound_enabled: bool) -> Self {
        self.sound_enabled = sound_enabled;
        self
    }

    pub fn with_autoplay(mut self, can_autoplay: bool) -> Self {
        self.can_autoplay = can_autoplay;
        self
    }

    pub fn with_visibility(mut self, is_document_visible: bool) -> Self {
        self.is_document_visible = is_document_visible;
        self
    }

    fn is_gated(&self) -> bool {
        !self.can_autoplay || !self.is_document_visible
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioEngineConfig {
    pub crossfade_ms: u64,
}

impl Default for AudioEngineConfig {
    fn default() -> Self {
        Self {
            crossfade_ms: DEFAULT_CROSSFADE_MS,
        }
    }
}

impl AudioEngineConfig {
    pub fn with_crossfade_ms(mut self, crossfade_ms: u64) -> Self {
        self.crossfade_ms = crossfade_ms;
        self
    }
}

/// One active track.
struct AudioHandle {
    id: u64,
    kind: TrackKind,
    element: Arc<dyn AudioElementPort>,
    original_url: String,
    resolved_url: String,
    from_cache: bool,
    base_volume: f64,
    fade_in_ms: u64,
    fade_out_ms: u64,
    has_started: bool,
    resume_on_visible: bool,
    node_id: Option<NodeId>,
    one_shot: bool,
    fade: Option<JoinHandle<()>>,
}

impl AudioHandle {
    fn cancel_fade(&mut self) {
        if let Some(fade) = self.fade.take() {
            fade.abort();
        }
    }

    /// Debug fields identifying this track.
    fn describe(&self) -> TrackUpdate {
        TrackUpdate::new()
            .requested(Some(&self.original_url))
            .resolved(Some(&self.resolved_url))
    }
}

/// What to do once a fade has reached its target.
enum FadeEnd {
    /// Pause the element and release its source.
    Dispose,
    /// Record `status` for the track, with the element's final volume, if
    /// handle `id` still owns it.
    Report {
        id: u64,
        kind: TrackKind,
        status: TrackStatus,
        update: TrackUpdate,
    },
}

impl FadeEnd {
    fn complete(self, element: &dyn AudioElementPort, shared: &Weak<Shared>) {
        match self {
            FadeEnd::Dispose => dispose_element(element),
            report => {
                if let Some(shared) = shared.upgrade() {
                    shared.update(|state| state.finish_fade(element, report));
                }
            }
        }
    }
}

fn dispose_element(element: &dyn AudioElementPort) {
    element.pause();
    element.clear_source();
}

fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

struct ResolvedSource {
    url: String,
    object_url: String,
    from_cache: bool,
}

enum Resolution {
    Found(ResolvedSource),
    /// Every candidate failed
    Missing,
    /// A newer request superseded this one
    Stale,
}

#[derive(Default)]
struct EngineState {
    playback: PlaybackState,
    request_id: u64,
    main: Option<AudioHandle>,
    alt: Option<AudioHandle>,
    preload: PreloadCache,
    alt_played: HashSet<NodeId>,
    main_debug: Option<TrackDebug>,
    alt_debug: Option<TrackDebug>,
    listener: Option<DebugListener>,
    next_handle_id: u64,
}

impl EngineState {
    fn handle_mut(&mut self, kind: TrackKind) -> Option<&mut AudioHandle> {
        match kind {
            TrackKind::Main => self.main.as_mut(),
            TrackKind::Alt => self.alt.as_mut(),
        }
    }

    fn track_mut(&mut self, kind: TrackKind) -> &mut TrackDebug {
        match kind {
            TrackKind::Main => self.main_debug.get_or_insert_with(TrackDebug::default),
            TrackKind::Alt => self.alt_debug.get_or_insert_with(TrackDebug::default),
        }
    }

    fn set_track(&mut self, kind: TrackKind, status: TrackStatus, update: TrackUpdate) {
        update.apply(status, self.track_mut(kind));
    }

    fn finish_fade(&mut self, element: &dyn AudioElementPort, end: FadeEnd) {
        match end {
            FadeEnd::Dispose => dispose_element(element),
            FadeEnd::Report {
                id,
                kind,
                status,
                update,
            } => {
                if self.handle_mut(kind).is_some_and(|handle| handle.id == id) {
                    self.set_track(kind, status, update.volume(element.volume()));
                }
            }
        }
    }

    fn snapshot(&self) -> AudioDebugSnapshot {
        AudioDebugSnapshot {
            main: self.main_debug.clone(),
            alt: self.alt_debug.clone(),
            preload: self.preload.entries(),
        }
    }

    fn next_handle_id(&mut self) -> u64 {
        self.next_handle_id += 1;
        self.next_handle_id
    }
}

struct Shared {
    self_ref: Weak<Shared>,
    state: Mutex<EngineState>,
    fetcher: Arc<dyn MediaFetchPort>,
    object_urls: Arc<dyn ObjectUrlPort>,
    output: Arc<dyn AudioOutputPort>,
    crossfade_ms: u64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the state, then hand a snapshot to the debug listener outside the lock.
    fn update<R>(&self, f: impl FnOnce(&mut EngineState) -> R) -> R {
        let (result, notify) = {
            let mut state = self.lock();
            let result = f(&mut state);
            let notify = state
                .listener
                .clone()
                .map(|listener| (listener, state.snapshot()));
            (result, notify)
        };
        if let Some((listener, snapshot)) = notify {
            listener(snapshot);
        }
        result
    }

    /// Start fading `handle` towards `target`.
    ///
    /// Returns `end` when the fade completed synchronously (zero duration or no
    /// runtime to drive a timer); the caller applies it.
    fn fade(
        &self,
        handle: &mut AudioHandle,
        target: f64,
        duration_ms: u64,
        end: FadeEnd,
    ) -> Option<FadeEnd> {
        handle.cancel_fade();
        if duration_ms == 0 || tokio::runtime::Handle::try_current().is_err() {
            handle.element.set_volume(clamp01(target));
            return Some(end);
        }
        let shared = self.self_ref.clone();
        handle.fade = Some(spawn_fade(
            handle.element.clone(),
            target,
            duration_ms,
            move |element| end.complete(element, &shared),
        ));
        None
    }

    fn stop_handle(&self, mut handle: AudioHandle, fade_ms: u64) {
        debug!(track = ?handle.kind, url = %handle.original_url, fade_ms, "Stopping audio track");
        if self.fade(&mut handle, 0.0, fade_ms, FadeEnd::Dispose).is_some() {
            dispose_element(handle.element.as_ref());
        }
    }

    fn stop_main(&self, state: &mut EngineState, fade_ms: u64) {
        if let Some(main) = state.main.take() {
            self.stop_handle(main, fade_ms);
        }
        state.set_track(
            TrackKind::Main,
            TrackStatus::Stopped,
            TrackUpdate::new().requested(None).resolved(None).volume(0.0),
        );
    }

    /// Bring one track in line with the current playback state.
    fn apply_playback(&self, state: &mut EngineState, kind: TrackKind) {
        let playback = state.playback;
        let Some(handle) = state.handle_mut(kind) else {
            return;
        };
        let element = handle.element.clone();

        if playback.is_gated() {
            handle.resume_on_visible = !element.is_paused();
            handle.cancel_fade();
            element.pause();
            let update = handle.describe().volume(element.volume());
            state.set_track(kind, TrackStatus::Paused, update);
            return;
        }

        let mut played_node = None;
        let end = if playback.sound_enabled {
            if element.is_paused() {
                if let Err(err) = element.play() {
                    warn!(track = ?kind, url = %handle.original_url, error = %err, "Audio play blocked");
                }
            }
            handle.resume_on_visible = false;
            if kind == TrackKind::Alt && handle.one_shot {
                played_node = handle.node_id;
            }
            let fade_ms = if handle.has_started {
                RESUME_FADE_MS
            } else {
                handle.fade_in_ms
            };
            handle.has_started = true;
            let end = FadeEnd::Report {
                id: handle.id,
                kind,
                status: TrackStatus::Playing,
                update: handle.describe().from_cache(handle.from_cache),
            };
            let target = handle.base_volume;
            self.fade(handle, target, fade_ms, end)
        } else {
            if handle.resume_on_visible && element.is_paused() {
                if let Err(err) = element.play() {
                    warn!(track = ?kind, url = %handle.original_url, error = %err, "Audio play blocked");
                }
                handle.resume_on_visible = false;
            }
            let end = FadeEnd::Report {
                id: handle.id,
                kind,
                status: TrackStatus::Paused,
                update: handle.describe(),
            };
            self.fade(handle, 0.0, MUTE_FADE_MS, end)
        };

        if let Some(node_id) = played_node {
            state.alt_played.insert(node_id);
        }
        if let Some(end) = end {
            state.finish_fade(element.as_ref(), end);
        }
    }

    fn install_main(
        &self,
        state: &mut EngineState,
        source: &AudioSourceConfig,
        resolved: ResolvedSource,
        fade_in_ms: u64,
        fade_out_ms: u64,
    ) {
        if let Some(main) = state
            .main
            .as_mut()
            .filter(|main| main.original_url == resolved.url)
        {
            debug!(url = %resolved.url, "Main track unchanged, updating in place");
            main.base_volume = source.volume;
            main.fade_in_ms = fade_in_ms;
            main.fade_out_ms = fade_out_ms;
            main.element.set_looping(source.looping);
            main.node_id = source.node_id;
            main.resolved_url = resolved.object_url;
            main.from_cache = resolved.from_cache;
            self.apply_playback(state, TrackKind::Main);
            return;
        }

        if let Some(previous) = state.main.take() {
            self.stop_handle(previous, fade_out_ms);
        }

        let element = self.output.create_element(&resolved.object_url);
        element.set_looping(source.looping);
        element.set_volume(0.0);

        let id = state.next_handle_id();
        let shared = self.self_ref.clone();
        element.on_ended(Box::new(move || {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            shared.update(|state| {
                let update = state
                    .main
                    .as_ref()
                    .filter(|main| main.id == id && !main.element.is_looping())
                    .map(AudioHandle::describe);
                if let Some(update) = update {
                    state.set_track(TrackKind::Main, TrackStatus::Stopped, update);
                }
            });
        }));

        debug!(url = %resolved.url, resolved = %resolved.object_url, from_cache = resolved.from_cache, "Starting main track");
        state.main = Some(AudioHandle {
            id,
            kind: TrackKind::Main,
            element,
            original_url: resolved.url,
            resolved_url: resolved.object_url,
            from_cache: resolved.from_cache,
            base_volume: source.volume,
            fade_in_ms,
            fade_out_ms,
            has_started: false,
            resume_on_visible: false,
            node_id: source.node_id,
            one_shot: false,
            fade: None,
        });
        self.apply_playback(state, TrackKind::Main);
    }

    fn install_alt(
        &self,
        state: &mut EngineState,
        source: &AudioSourceConfig,
        resolved: ResolvedSource,
        fade_in_ms: u64,
    ) {
        let element = self.output.create_element(&resolved.object_url);
        element.set_looping(false);
        element.set_volume(0.0);

        let id = state.next_handle_id();
        let node_id = source.node_id;
        let one_shot = source.alt_behavior == AltBehavior::PlayOnce;
        let shared = self.self_ref.clone();
        element.on_ended(Box::new(move || {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            shared.update(|state| {
                if let Some(node_id) = node_id.filter(|_| one_shot) {
                    state.alt_played.insert(node_id);
                }
                if state.alt.as_ref().is_some_and(|alt| alt.id == id) {
                    if let Some(mut alt) = state.alt.take() {
                        alt.cancel_fade();
                        state.set_track(TrackKind::Alt, TrackStatus::Stopped, alt.describe());
                        dispose_element(alt.element.as_ref());
                    }
                }
            });
        }));

        debug!(url = %resolved.url, one_shot, "Starting alt track");
        state.alt = Some(AudioHandle {
            id,
            kind: TrackKind::Alt,
            element,
            original_url: resolved.url,
            resolved_url: resolved.object_url,
            from_cache: resolved.from_cache,
            base_volume: source.volume,
            fade_in_ms,
            fade_out_ms: self.crossfade_ms,
            has_started: false,
            resume_on_visible: false,
            node_id,
            one_shot,
            fade: None,
        });
        self.apply_playback(state, TrackKind::Alt);
    }

    /// The shared fetch for `url`, started under cache epoch `epoch`.
    fn fetch_future(&self, url: &str, epoch: u64) -> SharedFetch {
        let url = url.to_string();
        let fetcher = self.fetcher.clone();
        let object_urls = self.object_urls.clone();
        let shared = self.self_ref.clone();
        async move {
            let result = fetcher.fetch(&url).await;
            let shared = shared.upgrade()?;
            match result {
                Ok(bytes) => {
                    let object_url = object_urls.create(bytes);
                    if shared.update(|state| state.preload.complete_loaded(&url, epoch, &object_url)) {
                        debug!(url = %url, object_url = %object_url, "Audio preloaded");
                        Some(object_url)
                    } else {
                        debug!(url = %url, "Discarding preload finished after reset");
                        object_urls.revoke(&object_url);
                        None
                    }
                }
                Err(err) => {
                    warn!(url = %url, error = %err, "Audio preload failed");
                    shared.update(|state| state.preload.complete_failed(&url, epoch));
                    None
                }
            }
        }
        .boxed()
        .shared()
    }
}

/// Long-lived audio engine. Cheap to clone; clones drive the same tracks.
#[derive(Clone)]
pub struct AudioEngine {
    shared: Arc<Shared>,
}

impl AudioEngine {
    pub fn new(
        fetcher: Arc<dyn MediaFetchPort>,
        object_urls: Arc<dyn ObjectUrlPort>,
        output: Arc<dyn AudioOutputPort>,
        config: AudioEngineConfig,
    ) -> Self {
        let shared = Arc::new_cyclic(|self_ref| Shared {
            self_ref: self_ref.clone(),
            state: Mutex::new(EngineState::default()),
            fetcher,
            object_urls,
            output,
            crossfade_ms: config.crossfade_ms,
        });
        Self { shared }
    }

    pub fn crossfade_ms(&self) -> u64 {
        self.shared.crossfade_ms
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.shared.lock().playback
    }

    pub fn set_playback_state(&self, playback: PlaybackState) {
        self.shared.update(|state| {
            state.playback = playback;
            self.shared.apply_playback(state, TrackKind::Main);
            self.shared.apply_playback(state, TrackKind::Alt);
        });
    }

    /// Switch to the audio for a newly shown node. `None` stops everything.
    pub async fn set_source(&self, source: Option<AudioSourceConfig>) {
        let crossfade_ms = self.shared.crossfade_ms;
        let token = self.shared.update(|state| {
            state.request_id += 1;
            if let Some(alt) = state.alt.take() {
                let fade_ms = alt.fade_out_ms;
                self.shared.stop_handle(alt, fade_ms);
            }
            state.set_track(
                TrackKind::Alt,
                TrackStatus::Stopped,
                TrackUpdate::new().requested(None).resolved(None),
            );
            state.request_id
        });

        let stop_fade_ms = source
            .as_ref()
            .and_then(|source| source.fade_out_seconds)
            .map(seconds_to_ms)
            .filter(|ms| *ms > 0)
            .unwrap_or(crossfade_ms);

        let Some(source) = source.filter(|source| !source.is_silent()) else {
            self.shared
                .update(|state| self.shared.stop_main(state, stop_fade_ms));
            return;
        };

        let fade_in_ms = source.fade_in_seconds.map_or(crossfade_ms, seconds_to_ms);
        let fade_out_ms = source.fade_out_seconds.map_or(crossfade_ms, seconds_to_ms);

        if source.main_candidates.is_empty() {
            self.shared
                .update(|state| self.shared.stop_main(state, stop_fade_ms));
        } else {
            match self
                .resolve_candidates(&source.main_candidates, TrackKind::Main, token)
                .await
            {
                Resolution::Stale => return,
                Resolution::Missing => {
                    let first = source.main_candidates.first().map(String::as_str);
                    self.shared.update(|state| {
                        if state.request_id == token {
                            state.set_track(
                                TrackKind::Main,
                                TrackStatus::Error,
                                TrackUpdate::new().requested(first),
                            );
                        }
                    });
                    return;
                }
                Resolution::Found(resolved) => {
                    let current = self.shared.update(|state| {
                        if state.request_id != token {
                            return false;
                        }
                        self.shared
                            .install_main(state, &source, resolved, fade_in_ms, fade_out_ms);
                        true
                    });
                    if !current {
                        return;
                    }
                }
            }
        }

        let already_played = source.alt_behavior == AltBehavior::PlayOnce
            && source
                .node_id
                .is_some_and(|node_id| self.shared.lock().alt_played.contains(&node_id));
        if source.alt_candidates.is_empty() || already_played {
            return;
        }

        match self
            .resolve_candidates(&source.alt_candidates, TrackKind::Alt, token)
            .await
        {
            Resolution::Stale => {}
            Resolution::Missing => {
                let first = source.alt_candidates.first().map(String::as_str);
                self.shared.update(|state| {
                    if state.request_id == token {
                        state.set_track(
                            TrackKind::Alt,
                            TrackStatus::Error,
                            TrackUpdate::new().requested(first),
                        );
                    }
                });
            }
            Resolution::Found(resolved) => {
                self.shared.update(|state| {
                    if state.request_id == token {
                        self.shared.install_alt(state, &source, resolved, fade_in_ms);
                    }
                });
            }
        }
    }

    /// Warm the cache for upcoming nodes. Blank entries are skipped.
    pub fn preload<I, S>(&self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("Audio preload requested outside a tokio runtime");
            return;
        };
        for url in urls {
            let url = url.as_ref().trim();
            if url.is_empty() {
                continue;
            }
            let engine = self.clone();
            let url = url.to_string();
            runtime.spawn(async move {
                engine.preload_url(&url).await;
            });
        }
    }

    pub fn set_debug_listener(&self, listener: Option<DebugListener>) {
        let emit = listener.is_some();
        if emit {
            self.shared.update(|state| state.listener = listener);
        } else {
            self.shared.lock().listener = None;
        }
    }

    pub fn get_debug_state(&self) -> AudioDebugSnapshot {
        self.shared.lock().snapshot()
    }

    /// Stop everything immediately and forget every cached URL.
    pub fn reset(&self) {
        self.shared.update(|state| {
            state.request_id += 1;
            for handle in [state.main.take(), state.alt.take()].into_iter().flatten() {
                self.shared.stop_handle(handle, 0);
            }
            state.alt_played.clear();
            for object_url in state.preload.clear() {
                self.shared.object_urls.revoke(&object_url);
            }
            state.main_debug = Some(TrackDebug::default());
            state.alt_debug = Some(TrackDebug::default());
        });
        debug!("Audio engine reset");
    }

    pub fn dispose(&self) {
        self.reset();
        self.shared.lock().listener = None;
    }

    async fn resolve_candidates(
        &self,
        candidates: &[String],
        kind: TrackKind,
        token: u64,
    ) -> Resolution {
        for candidate in candidates {
            self.shared.update(|state| {
                state.set_track(
                    kind,
                    TrackStatus::Resolving,
                    TrackUpdate::new().requested(Some(candidate)),
                );
            });
            let outcome = self.preload_url(candidate).await;
            if self.shared.lock().request_id != token {
                debug!(track = ?kind, url = %candidate, "Dropping stale audio resolution");
                return Resolution::Stale;
            }
            if let Some(object_url) = outcome.object_url {
                return Resolution::Found(ResolvedSource {
                    url: candidate.clone(),
                    object_url,
                    from_cache: outcome.from_cache,
                });
            }
        }
        Resolution::Missing
    }

    async fn preload_url(&self, url: &str) -> PreloadOutcome {
        if url.is_empty() {
            return PreloadOutcome::failed();
        }

        enum Step {
            Hit(String),
            Join(SharedFetch, u64),
            Fetch(SharedFetch),
        }

        let step = self.shared.update(|state| {
            if let Some(object_url) = state.preload.cached(url) {
                state.preload.record(url, PreloadStatus::Hit);
                return Step::Hit(object_url);
            }
            if let Some(fetch) = state.preload.inflight(url) {
                return Step::Join(fetch, state.preload.epoch());
            }
            let fetch = self.shared.fetch_future(url, state.preload.epoch());
            state.preload.begin(url, fetch.clone());
            Step::Fetch(fetch)
        });

        match step {
            Step::Hit(object_url) => PreloadOutcome::cached(Some(object_url)),
            Step::Join(fetch, epoch) => {
                let object_url = fetch.await;
                let status = if object_url.is_some() {
                    PreloadStatus::Hit
                } else {
                    PreloadStatus::Error
                };
                self.shared
                    .update(|state| state.preload.record_since(url, epoch, status));
                PreloadOutcome::cached(object_url)
            }
            Step::Fetch(fetch) => PreloadOutcome::fetched(fetch.await),
        }
    }
}

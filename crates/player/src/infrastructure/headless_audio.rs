//! Headless audio output
//!
//! Tracks element state (volume, paused, loop, source) without producing
//! sound. Used by the CLI and by tests, which drive end-of-media with
//! [`HeadlessElement::finish`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::ports::outbound::{AudioElementPort, AudioOutputPort, EndedCallback, MediaError};

type SharedCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct ElementState {
    volume: f64,
    paused: bool,
    looping: bool,
    cleared: bool,
}

pub struct HeadlessElement {
    url: String,
    state: Mutex<ElementState>,
    ended: Mutex<Option<SharedCallback>>,
}

impl HeadlessElement {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            state: Mutex::new(ElementState {
                volume: 0.0,
                paused: true,
                looping: false,
                cleared: false,
            }),
            ended: Mutex::new(None),
        }
    }

    fn state(&self) -> MutexGuard<'_, ElementState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn url(&self) -> String {
        self.url.clone()
    }

    /// True once the source was released.
    pub fn is_cleared(&self) -> bool {
        self.state().cleared
    }

    /// Simulate the media reaching its end. Looping and released elements
    /// ignore this.
    pub fn finish(&self) {
        {
            let mut state = self.state();
            if state.looping || state.cleared || state.paused {
                return;
            }
            state.paused = true;
        }
        let callback = self
            .ended
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        debug!(url = %self.url, "Headless element ended");
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl AudioElementPort for HeadlessElement {
    fn play(&self) -> Result<(), MediaError> {
        let mut state = self.state();
        if state.cleared {
            return Err(MediaError::NoSource);
        }
        state.paused = false;
        debug!(url = %self.url, volume = state.volume, "Headless element playing");
        Ok(())
    }

    fn pause(&self) {
        self.state().paused = true;
    }

    fn is_paused(&self) -> bool {
        self.state().paused
    }

    fn volume(&self) -> f64 {
        self.state().volume
    }

    fn set_volume(&self, volume: f64) {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.state().volume = volume;
        trace!(url = %self.url, volume, "Headless element volume");
    }

    fn set_looping(&self, looping: bool) {
        self.state().looping = looping;
    }

    fn is_looping(&self) -> bool {
        self.state().looping
    }

    fn clear_source(&self) {
        let mut state = self.state();
        state.cleared = true;
        state.paused = true;
        debug!(url = %self.url, "Headless element released");
    }

    fn on_ended(&self, callback: EndedCallback) {
        *self.ended.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::from(callback));
    }
}

/// Creates [`HeadlessElement`]s and keeps every one it created.
#[derive(Default)]
pub struct HeadlessAudioOutput {
    elements: Mutex<Vec<Arc<HeadlessElement>>>,
}

impl HeadlessAudioOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every element created so far, oldest first.
    pub fn elements(&self) -> Vec<Arc<HeadlessElement>> {
        self.elements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Elements that are neither paused nor released.
    pub fn playing(&self) -> Vec<Arc<HeadlessElement>> {
        self.elements()
            .into_iter()
            .filter(|element| !element.is_paused() && !element.is_cleared())
            .collect()
    }
}

impl AudioOutputPort for HeadlessAudioOutput {
    fn create_element(&self, url: &str) -> Arc<dyn AudioElementPort> {
        let element = Arc::new(HeadlessElement::new(url));
        self.elements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(element.clone());
        element
    }
}

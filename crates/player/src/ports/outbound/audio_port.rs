//! Audio output port - the playback device seen by the audio engine
//!
//! Note: `AudioElementPort` takes a boxed `Fn` for end notifications, which
//! mockall cannot mock. Tests use the headless adapter instead.

use std::sync::Arc;

use super::MediaError;

/// Invoked when a non-looping element reaches its end.
pub type EndedCallback = Box<dyn Fn() + Send + Sync>;

/// One playable media element.
///
/// Implementations must never invoke the ended callback synchronously from
/// inside one of these methods; the engine calls them while holding its lock.
pub trait AudioElementPort: Send + Sync {
    /// Start or resume playback. Errors mean the output refused to play.
    fn play(&self) -> Result<(), MediaError>;

    fn pause(&self);

    fn is_paused(&self) -> bool;

    /// Current volume, 0..=1
    fn volume(&self) -> f64;

    fn set_volume(&self, volume: f64);

    fn set_looping(&self, looping: bool);

    fn is_looping(&self) -> bool;

    /// Drop the source so the element releases its media.
    fn clear_source(&self);

    fn on_ended(&self, callback: EndedCallback);
}

/// Creates media elements for resolved (object) URLs.
#[cfg_attr(test, mockall::automock)]
pub trait AudioOutputPort: Send + Sync {
    /// A new paused element for `url` with volume 0.
    fn create_element(&self, url: &str) -> Arc<dyn AudioElementPort>;
}

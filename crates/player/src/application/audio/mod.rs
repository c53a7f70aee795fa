//! Background audio: the engine, its fades and its debug snapshot.

mod debug;
mod engine;
mod fade;
mod preload;

pub use debug::{
    AudioDebugSnapshot, DebugListener, PreloadEntry, PreloadStatus, TrackDebug, TrackKind,
    TrackStatus,
};
pub use engine::{AudioEngine, AudioEngineConfig, PlaybackState, DEFAULT_CROSSFADE_MS};
pub use fade::{eased_volume, fade_steps, FADE_TICK};

pub mod audio;
pub mod services;

pub use audio::{AudioEngine, AudioEngineConfig, PlaybackState};
pub use services::{PlayerSession, SessionError};

//! storyweb player runtime.
//!
//! Walks an adventure's node graph for one reader and keeps background audio
//! in step with the node being shown. The session and the audio engine talk
//! to the outside world only through the traits in [`ports::outbound`].

pub mod application;
pub mod cli;
pub mod infrastructure;
pub mod ports;

pub use application::{AudioEngine, AudioEngineConfig, PlaybackState, PlayerSession, SessionError};

//! Outbound ports - Interfaces for external services
//!
//! These ports define the contracts that infrastructure adapters must implement,
//! allowing the session and the audio engine to reach the network, the audio
//! device and the RNG without depending on concrete implementations.

pub mod audio_port;
pub mod media_port;
pub mod random_port;

pub use audio_port::{AudioElementPort, AudioOutputPort, EndedCallback};
pub use media_port::{MediaError, MediaFetchPort, ObjectUrlPort};
pub use random_port::RandomPort;

#[cfg(test)]
pub use audio_port::MockAudioOutputPort;
#[cfg(test)]
pub use media_port::{MockMediaFetchPort, MockObjectUrlPort};
#[cfg(test)]
pub use random_port::MockRandomPort;

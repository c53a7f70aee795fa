//! Application services
//!
//! Services implement the player's use cases on top of the domain crate and
//! depend on port traits, not concrete infrastructure.

pub mod session_service;

pub use session_service::{
    HistoryEntry, PlayerSession, SessionError, Transition, DEFAULT_MAX_REDIRECTS,
};

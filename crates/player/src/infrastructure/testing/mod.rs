//! Test doubles for the player's outbound ports.

mod fakes;

pub use fakes::FakeMediaFetcher;

//! Platform-specific implementations
//!
//! This module provides the desktop implementations of the platform
//! abstraction traits defined in `ports/outbound`.

mod desktop;

pub use desktop::DesktopRandomProvider;

pub mod blob_store;
pub mod config;
#[cfg(feature = "device-audio")]
pub mod device_audio;
pub mod headless_audio;
pub mod http_media;
pub mod platform;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use blob_store::BlobStore;
pub use config::PlayerConfig;
#[cfg(feature = "device-audio")]
pub use device_audio::{DeviceAudioOutput, DeviceElement};
pub use headless_audio::{HeadlessAudioOutput, HeadlessElement};
pub use http_media::HttpMediaFetcher;
pub use platform::DesktopRandomProvider;

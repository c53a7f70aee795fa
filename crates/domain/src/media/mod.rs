//! Media lookups: upload candidates, embedded URLs, per-node media and the
//! audio source config.

mod audio_source;
mod candidates;
mod urls;
mod view;

pub use audio_source::{
    build_audio_source_config, clamp_volume, coerce_seconds, normalize_audio_volume, AltBehavior,
    AudioSourceConfig,
};
pub use candidates::{
    raw_subtitles_value, resolve_audio_candidates, resolve_node_image_url,
    resolve_node_video_source, resolve_subtitle_candidates, resolve_upload_candidates,
    video_audio_setting, video_loop_setting, VideoAudioSetting,
};
pub use urls::{
    clean_url, extract_first_http_url, is_allowed_url, resolve_reference_url,
    resolve_video_source,
};
pub use view::{resolve_node_media, NodeMedia, NodeVideo, ReferenceLink};

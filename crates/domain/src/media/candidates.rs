//! Candidate URLs for uploaded media, tried in order until one loads.

use serde::Serialize;

use super::urls::resolve_video_source;
use crate::value_objects::prop_keys;
use crate::{Adventure, Node};

/// Expand a stored media value into the URLs worth probing.
///
/// Absolute http(s) URLs and site-relative paths are used as-is. Bare file
/// names are looked up under the adventure slug, then the view slug, then the
/// upload root, and finally tried raw. Duplicates are dropped.
pub fn resolve_upload_candidates(
    slug: Option<&str>,
    view_slug: Option<&str>,
    raw: Option<&str>,
) -> Vec<String> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Vec::new();
    };

    let lower = value.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return vec![value.to_string()];
    }

    let mut candidates: Vec<String> = Vec::new();
    let mut push = |url: String| {
        if !url.is_empty() && !candidates.contains(&url) {
            candidates.push(url);
        }
    };

    if !value.starts_with('/') {
        let file = value.trim_start_matches('/');
        let slug = slug.filter(|s| !s.is_empty());
        let view_slug = view_slug.filter(|s| !s.is_empty());
        let primary = slug.or(view_slug);
        if let Some(primary) = primary {
            push(format!("/upload/{}/{}", primary, file));
        }
        if let Some(view_slug) = view_slug.filter(|v| Some(*v) != primary) {
            push(format!("/upload/{}/{}", view_slug, file));
        }
        push(format!("/upload/{}", file));
    }
    push(value.to_string());

    candidates
}

fn adventure_candidates(adventure: Option<&Adventure>, raw: Option<&str>) -> Vec<String> {
    resolve_upload_candidates(
        adventure.and_then(Adventure::slug),
        adventure.and_then(Adventure::view_slug),
        raw,
    )
}

pub fn resolve_audio_candidates(adventure: Option<&Adventure>, raw: Option<&str>) -> Vec<String> {
    adventure_candidates(adventure, raw)
}

pub fn resolve_subtitle_candidates(
    adventure: Option<&Adventure>,
    raw: Option<&str>,
) -> Vec<String> {
    adventure_candidates(adventure, raw)
}

/// Stored subtitles value: editor props first, then the raw bag.
pub fn raw_subtitles_value(node: &Node) -> Option<String> {
    node.props
        .first_string(prop_keys::SUBTITLES_URL)
        .or_else(|| node.raw_props.first_string(prop_keys::SUBTITLES_URL))
}

/// Background image URL, resolved to its first upload candidate.
pub fn resolve_node_image_url(node: &Node, adventure: Option<&Adventure>) -> Option<String> {
    let raw = node
        .image_url()
        .map(str::to_string)
        .or_else(|| node.raw_props.first_string(prop_keys::IMAGE_URL))
        .or_else(|| node.props.first_string(prop_keys::IMAGE_URL))?;
    adventure_candidates(adventure, Some(&raw))
        .into_iter()
        .next()
        .or(Some(raw))
}

/// Video for a node: an mp4 image URL wins, else whatever the node carries.
pub fn resolve_node_video_source(node: &Node, image_url: Option<&str>) -> Option<String> {
    match image_url {
        Some(url) if url.to_lowercase().contains(".mp4") => Some(url.to_string()),
        _ => resolve_video_source(Some(node)),
    }
}

/// Video loops unless the node turns looping off explicitly.
pub fn video_loop_setting(node: &Node) -> bool {
    node.raw_props
        .read(prop_keys::VIDEO_LOOP)
        .map_or(true, crate::value_objects::boolean_from_tokens)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoAudioSetting {
    #[default]
    On,
    Off,
    OffMobile,
}

pub fn video_audio_setting(node: &Node) -> VideoAudioSetting {
    let tokens = node.raw_props.lowercase_tokens(prop_keys::VIDEO_AUDIO);
    match tokens.first().map(String::as_str) {
        Some("off") => VideoAudioSetting::Off,
        Some("off_mobile") => VideoAudioSetting::OffMobile,
        _ => VideoAudioSetting::On,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_file_name_candidates() {
        let candidates = resolve_upload_candidates(Some("my-adv"), Some("view"), Some(" song.mp3 "));
        assert_eq!(
            candidates,
            vec![
                "/upload/my-adv/song.mp3",
                "/upload/view/song.mp3",
                "/upload/song.mp3",
                "song.mp3",
            ]
        );
    }

    #[test]
    fn test_view_slug_used_when_slug_missing() {
        let candidates = resolve_upload_candidates(None, Some("view"), Some("a.mp3"));
        assert_eq!(candidates, vec!["/upload/view/a.mp3", "/upload/a.mp3", "a.mp3"]);

        let no_slugs = resolve_upload_candidates(Some(""), None, Some("a.mp3"));
        assert_eq!(no_slugs, vec!["/upload/a.mp3", "a.mp3"]);
    }

    #[test]
    fn test_absolute_and_rooted_values() {
        assert_eq!(
            resolve_upload_candidates(Some("s"), None, Some("HTTPS://cdn.example.com/a.mp3")),
            vec!["HTTPS://cdn.example.com/a.mp3"]
        );
        assert_eq!(
            resolve_upload_candidates(Some("s"), None, Some("/upload/s/a.mp3")),
            vec!["/upload/s/a.mp3"]
        );
        assert!(resolve_upload_candidates(Some("s"), None, Some("  ")).is_empty());
        assert!(resolve_upload_candidates(Some("s"), None, None).is_empty());
    }

    #[test]
    fn test_node_image_uses_first_candidate() {
        let adventure = Adventure::new("demo", "Demo");
        let node = Node::new(1, "n").with_raw_prop("image_url", "bg.png");
        assert_eq!(
            resolve_node_image_url(&node, Some(&adventure)),
            Some("/upload/demo/bg.png".into())
        );
        assert_eq!(resolve_node_image_url(&Node::new(2, "n"), Some(&adventure)), None);
    }

    #[test]
    fn test_subtitles_prefer_editor_props() {
        let node = Node::new(1, "n")
            .with_prop("subtitlesUrl", "editor.vtt")
            .with_raw_prop("subtitles_url", "raw.vtt");
        assert_eq!(raw_subtitles_value(&node), Some("editor.vtt".into()));

        let raw_only = Node::new(2, "n").with_raw_prop("subtitles_url", " raw.vtt ");
        assert_eq!(raw_subtitles_value(&raw_only), Some("raw.vtt".into()));

        let blank_editor = Node::new(3, "n")
            .with_prop("subtitles_url", "")
            .with_raw_prop("subtitlesUrl", "raw.vtt");
        assert_eq!(raw_subtitles_value(&blank_editor), Some("raw.vtt".into()));
        assert_eq!(raw_subtitles_value(&Node::new(4, "n")), None);
    }

    #[test]
    fn test_subtitle_candidates_follow_upload_layout() {
        let adventure = Adventure::new("demo", "Demo");
        assert_eq!(
            resolve_subtitle_candidates(Some(&adventure), Some("intro.vtt")),
            vec!["/upload/demo/intro.vtt", "/upload/intro.vtt", "intro.vtt"]
        );
        assert_eq!(
            resolve_subtitle_candidates(None, Some("https://cdn.example.com/a.vtt")),
            vec!["https://cdn.example.com/a.vtt"]
        );
        assert!(resolve_subtitle_candidates(Some(&adventure), None).is_empty());
    }

    #[test]
    fn test_video_settings() {
        assert!(video_loop_setting(&Node::new(1, "n")));
        assert!(!video_loop_setting(&Node::new(1, "n").with_raw_prop("videoLoop", "off")));
        assert_eq!(
            video_audio_setting(&Node::new(1, "n").with_raw_prop("settings_videoAudio", "Off_Mobile")),
            VideoAudioSetting::OffMobile
        );
        assert_eq!(video_audio_setting(&Node::new(1, "n")), VideoAudioSetting::On);
    }

    #[test]
    fn test_node_video_source_prefers_mp4_image() {
        let node = Node::new(1, "n").with_text("https://cdn.example.com/b.mp4");
        assert_eq!(
            resolve_node_video_source(&node, Some("/upload/a.mp4")),
            Some("/upload/a.mp4".into())
        );
        assert_eq!(
            resolve_node_video_source(&node, Some("/upload/a.png")),
            Some("https://cdn.example.com/b.mp4".into())
        );
    }
}

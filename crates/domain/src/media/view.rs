//! Everything a player shows besides text and buttons for one node.

use serde::Serialize;

use super::candidates::{
    raw_subtitles_value, resolve_node_image_url, resolve_node_video_source,
    resolve_subtitle_candidates, video_audio_setting, video_loop_setting, VideoAudioSetting,
};
use super::urls::resolve_reference_url;
use crate::{Adventure, Node, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeVideo {
    pub source: String,
    pub looping: bool,
    pub audio: VideoAudioSetting,
    /// Playback controls are shown on video nodes only
    pub controls: bool,
    /// Subtitle URLs to try, in order
    pub subtitle_candidates: Vec<String>,
}

/// The external link of a reference node. `url` is `None` when the node text
/// holds no usable URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceLink {
    pub url: Option<String>,
    pub new_tab: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMedia {
    /// Background image; absent whenever a video plays
    pub image_url: Option<String>,
    pub video: Option<NodeVideo>,
    pub reference: Option<ReferenceLink>,
}

pub fn resolve_node_media(
    node: &Node,
    kind: NodeKind,
    adventure: Option<&Adventure>,
) -> NodeMedia {
    let image_url = resolve_node_image_url(node, adventure);
    let video = resolve_node_video_source(node, image_url.as_deref()).map(|source| NodeVideo {
        source,
        looping: video_loop_setting(node),
        audio: video_audio_setting(node),
        controls: kind == NodeKind::Video,
        subtitle_candidates: resolve_subtitle_candidates(
            adventure,
            raw_subtitles_value(node).as_deref(),
        ),
    });
    let reference = kind.is_reference().then(|| ReferenceLink {
        url: resolve_reference_url(Some(node)),
        new_tab: kind == NodeKind::ReferenceTab,
    });

    NodeMedia {
        image_url: if video.is_some() { None } else { image_url },
        video,
        reference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_tab_node() {
        let node = Node::new(1, "Wiki")
            .with_type("ref-node-tab")
            .with_text("<p>Read https://example.com/wiki, then return.</p>");
        let media = resolve_node_media(&node, NodeKind::ReferenceTab, None);
        assert_eq!(
            media.reference,
            Some(ReferenceLink {
                url: Some("https://example.com/wiki".into()),
                new_tab: true,
            })
        );
        assert_eq!(media.video, None);
    }

    #[test]
    fn test_reference_without_url() {
        let node = Node::new(1, "Wiki").with_text("nothing to open");
        let media = resolve_node_media(&node, NodeKind::Reference, None);
        assert_eq!(
            media.reference,
            Some(ReferenceLink {
                url: None,
                new_tab: false,
            })
        );
        assert_eq!(resolve_node_media(&node, NodeKind::Default, None).reference, None);
    }

    #[test]
    fn test_video_node_replaces_background_image() {
        let adventure = Adventure::new("demo", "Demo");
        let node = Node::new(1, "Clip")
            .with_raw_prop("image_url", "clip.mp4")
            .with_raw_prop("subtitles_url", "clip.vtt")
            .with_raw_prop("settings_videoLoop", "false")
            .with_raw_prop("settings_videoAudio", "off");
        let media = resolve_node_media(&node, NodeKind::Video, Some(&adventure));

        assert_eq!(media.image_url, None);
        let video = media.video.unwrap();
        assert_eq!(video.source, "/upload/demo/clip.mp4");
        assert!(!video.looping);
        assert!(video.controls);
        assert_eq!(video.audio, VideoAudioSetting::Off);
        assert_eq!(
            video.subtitle_candidates,
            vec!["/upload/demo/clip.vtt", "/upload/clip.vtt", "clip.vtt"]
        );
    }

    #[test]
    fn test_plain_node_keeps_image() {
        let adventure = Adventure::new("demo", "Demo");
        let node = Node::new(1, "Hall").with_raw_prop("image_url", "hall.png");
        let media = resolve_node_media(&node, NodeKind::Default, Some(&adventure));
        assert_eq!(media.image_url.as_deref(), Some("/upload/demo/hall.png"));
        assert_eq!(media.video, None);
        assert_eq!(media.reference, None);
    }
}

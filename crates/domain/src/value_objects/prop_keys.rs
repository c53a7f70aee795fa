//! Alias tables for every logical setting read from property bags.
//!
//! Order matters: the first alias present wins.

// Node kind
pub const CHAPTER_TYPE: &[&str] = &[
    "settings_chapterType",
    "settings_chaptertype",
    "chapterType",
    "chapter_type",
];

// Navigation
pub const NAVIGATION_STYLE: &[&str] = &[
    "background.navigation_style",
    "navigation_style",
    "backgroundNavigationStyle",
];
pub const NAVIGATION_SETTINGS: &[&str] = &[
    "playerNavigation.settings",
    "playerNavigation_settings",
    "playerNavigationSettings",
];
pub const ORDERED_LINK_IDS: &[&str] = &["ordered_link_ids", "button_order", "button-order"];

// Link conditioning
pub const POSITIVE_NODE_LIST: &[&str] = &[
    "positiveNodeList",
    "positive_node_list",
    "positiveNodes",
    "positive_nodes",
];
pub const NEGATIVE_NODE_LIST: &[&str] = &[
    "negativeNodeList",
    "negative_node_list",
    "negativeNodes",
    "negative_nodes",
];
pub const NODE_CONDITIONS: &[&str] = &["node_conditions", "nodeConditions", "node-conditions"];
pub const CONDITION_TYPE: &[&str] = &[
    "type_nodeconditions",
    "typeNodeconditions",
    "type-nodeconditions",
];
pub const CONDITION_ALPHA: &[&str] = &[
    "alpha_nodeconditions",
    "alphaNodeconditions",
    "alpha-nodeconditions",
];
pub const CONDITION_COLOR: &[&str] = &[
    "color_nodeconditions",
    "colorNodeconditions",
    "color-nodeconditions",
];
pub const CONDITION_BEHAVIOR: &[&str] = &[
    "conditionBehavior",
    "condition_behavior",
    "condition-behavior",
];

// Audio
pub const AUDIO_URL: &[&str] = &["audio_url", "audioUrl"];
pub const AUDIO_URL_ALT: &[&str] = &["audio_url_alt", "audioUrlAlt"];
pub const AUDIO_VOLUME: &[&str] = &["audio_volume", "audioVolume"];
pub const AUDIO_FADE_IN: &[&str] = &["settings_audioFadeIn", "audioFadeIn"];
pub const AUDIO_FADE_OUT: &[&str] = &["settings_audioFadeOut", "audioFadeOut"];
pub const AUDIO_LOOP: &[&str] = &["settings_audioLoop", "audioLoop"];
pub const EXTRA_AUDIO: &[&str] = &["settings_extraAudio", "extraAudio"];

// Media
pub const IMAGE_URL: &[&str] = &["image_url", "imageUrl"];
pub const SUBTITLES_URL: &[&str] = &["subtitlesUrl", "subtitles_url"];
pub const VIDEO_LOOP: &[&str] = &["settings_videoLoop", "videoLoop"];
pub const VIDEO_AUDIO: &[&str] = &["settings_videoAudio", "videoAudio"];

// Adventure
pub const FONT_LIST: &[&str] = &["fontList", "font_list"];

//! Audio source configuration derived from a node's properties.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::candidates::resolve_audio_candidates;
use crate::value_objects::{boolean_from_tokens, pick_first_string, prop_keys};
use crate::{Adventure, Node, NodeId};

/// How the overlay ("alt") track repeats across visits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltBehavior {
    /// Play once per node for the lifetime of the engine
    PlayOnce,
    #[default]
    Always,
}

/// What the audio engine should play for one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSourceConfig {
    pub node_id: Option<NodeId>,
    pub main_candidates: Vec<String>,
    pub alt_candidates: Vec<String>,
    /// 0..=1
    pub volume: f64,
    pub fade_in_seconds: Option<f64>,
    pub fade_out_seconds: Option<f64>,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub alt_behavior: AltBehavior,
}

impl Default for AudioSourceConfig {
    fn default() -> Self {
        Self {
            node_id: None,
            main_candidates: Vec::new(),
            alt_candidates: Vec::new(),
            volume: 1.0,
            fade_in_seconds: None,
            fade_out_seconds: None,
            looping: false,
            alt_behavior: AltBehavior::Always,
        }
    }
}

impl AudioSourceConfig {
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id: Some(node_id),
            ..Self::default()
        }
    }

    pub fn with_main(mut self, candidates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.main_candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_alt(mut self, candidates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.alt_candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = clamp_volume(volume, 1.0);
        self
    }

    pub fn with_fades(mut self, fade_in_seconds: Option<f64>, fade_out_seconds: Option<f64>) -> Self {
        self.fade_in_seconds = fade_in_seconds;
        self.fade_out_seconds = fade_out_seconds;
        self
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_alt_behavior(mut self, alt_behavior: AltBehavior) -> Self {
        self.alt_behavior = alt_behavior;
        self
    }

    /// Nothing to play on either track.
    pub fn is_silent(&self) -> bool {
        self.main_candidates.is_empty() && self.alt_candidates.is_empty()
    }
}

pub fn clamp_volume(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

/// First element of an array, or the value itself.
fn first_item(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

/// Loose numeric read: numbers, numeric strings (blank counts as zero) and booleans.
fn loose_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Volume from a slider (integer percent) or a fraction with a decimal point.
pub fn normalize_audio_volume(value: Option<&Value>) -> f64 {
    let Some(primary) = value.filter(|v| !v.is_null()).and_then(first_item) else {
        return 1.0;
    };
    let Some(numeric) = loose_number(primary) else {
        return 1.0;
    };
    let has_decimal = match primary {
        Value::String(s) => s.contains('.'),
        _ => numeric.fract() != 0.0,
    };
    if (0.0..=1.0).contains(&numeric) && has_decimal {
        return clamp_volume(numeric, 1.0);
    }
    clamp_volume(numeric / 100.0, 1.0)
}

/// Non-negative seconds, or `None` when absent or not numeric.
pub fn coerce_seconds(value: Option<&Value>) -> Option<f64> {
    let primary = value.filter(|v| !v.is_null()).and_then(first_item)?;
    loose_number(primary).map(|n| n.max(0.0))
}

fn audio_url(node: &Node, raw_keys: &[&str], props_key: &str) -> Option<String> {
    node.raw_props
        .read(raw_keys)
        .and_then(pick_first_string)
        .or_else(|| node.props.get(props_key).and_then(pick_first_string))
}

/// Build the audio config for `node` within `adventure`.
pub fn build_audio_source_config(node: &Node, adventure: Option<&Adventure>) -> AudioSourceConfig {
    let raw = &node.raw_props;
    let main = audio_url(node, prop_keys::AUDIO_URL, "audioUrl");
    let alt = audio_url(node, prop_keys::AUDIO_URL_ALT, "audioUrlAlt");
    let volume = raw
        .read(prop_keys::AUDIO_VOLUME)
        .or_else(|| node.props.get("audioVolume"));

    let extra_audio = raw.lowercase_tokens(prop_keys::EXTRA_AUDIO);
    let alt_behavior = if extra_audio.iter().any(|token| token == "play_once") {
        AltBehavior::PlayOnce
    } else {
        AltBehavior::Always
    };

    AudioSourceConfig {
        node_id: Some(node.node_id),
        main_candidates: resolve_audio_candidates(adventure, main.as_deref()),
        alt_candidates: resolve_audio_candidates(adventure, alt.as_deref()),
        volume: normalize_audio_volume(volume),
        fade_in_seconds: coerce_seconds(raw.read(prop_keys::AUDIO_FADE_IN)),
        fade_out_seconds: coerce_seconds(raw.read(prop_keys::AUDIO_FADE_OUT)),
        looping: raw.read(prop_keys::AUDIO_LOOP).is_some_and(boolean_from_tokens),
        alt_behavior,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_volume_normalization() {
        let vol = |v: Value| normalize_audio_volume(Some(&v));
        assert_eq!(normalize_audio_volume(None), 1.0);
        assert_eq!(vol(json!(0.5)), 0.5);
        assert_eq!(vol(json!("0.25")), 0.25);
        assert_eq!(vol(json!(1)), 0.01);
        assert_eq!(vol(json!("80")), 0.8);
        assert_eq!(vol(json!([50])), 0.5);
        assert_eq!(vol(json!(250)), 1.0);
        assert_eq!(vol(json!(-20)), 0.0);
        assert_eq!(vol(json!("loud")), 1.0);
    }

    #[test]
    fn test_coerce_seconds() {
        assert_eq!(coerce_seconds(Some(&json!("2.5"))), Some(2.5));
        assert_eq!(coerce_seconds(Some(&json!(-3))), Some(0.0));
        assert_eq!(coerce_seconds(Some(&json!(["1"]))), Some(1.0));
        assert_eq!(coerce_seconds(Some(&json!("abc"))), None);
        assert_eq!(coerce_seconds(None), None);
    }

    #[test]
    fn test_build_config_from_raw_props() {
        let adventure = Adventure::new("demo", "Demo");
        let node = Node::new(4, "Cave")
            .with_raw_prop("audio_url", "drip.mp3")
            .with_raw_prop("audioUrlAlt", json!(["", "echo.mp3"]))
            .with_raw_prop("audio_volume", "60")
            .with_raw_prop("settings_audioFadeIn", 2)
            .with_raw_prop("audioFadeOut", "0.5")
            .with_raw_prop("settings_audioLoop", "on")
            .with_raw_prop("settings_extraAudio", "PLAY_ONCE");

        let config = build_audio_source_config(&node, Some(&adventure));
        assert_eq!(config.node_id, Some(NodeId::new(4)));
        assert_eq!(config.main_candidates[0], "/upload/demo/drip.mp3");
        assert_eq!(config.alt_candidates.last().map(String::as_str), Some("echo.mp3"));
        assert_eq!(config.volume, 0.6);
        assert_eq!(config.fade_in_seconds, Some(2.0));
        assert_eq!(config.fade_out_seconds, Some(0.5));
        assert!(config.looping);
        assert_eq!(config.alt_behavior, AltBehavior::PlayOnce);
    }

    #[test]
    fn test_build_config_falls_back_to_editor_props() {
        let node = Node::new(5, "n")
            .with_prop("audioUrl", "https://cdn.example.com/a.mp3")
            .with_prop("audioVolume", 0.3);
        let config = build_audio_source_config(&node, None);
        assert_eq!(config.main_candidates, vec!["https://cdn.example.com/a.mp3"]);
        assert!(config.alt_candidates.is_empty());
        assert_eq!(config.volume, 0.3);
        assert!(!config.looping);
        assert_eq!(config.alt_behavior, AltBehavior::Always);
    }

    #[test]
    fn test_silent_node() {
        let config = build_audio_source_config(&Node::new(6, "n"), None);
        assert!(config.is_silent());
        assert_eq!(config.volume, 1.0);
    }
}

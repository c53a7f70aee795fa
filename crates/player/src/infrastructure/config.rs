//! Player configuration

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use storyweb_domain::navigation::normalize_nav_style;
use storyweb_domain::NavigationOverrides;
use url::Url;

use crate::application::audio::DEFAULT_CROSSFADE_MS;

/// Player configuration loaded from environment
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Adventure document (JSON)
    pub adventure_path: PathBuf,
    /// Base for relative media paths such as `/upload/...`
    pub media_base_url: Option<Url>,
    /// Crossfade between audio tracks
    pub crossfade_ms: u64,
    pub sound_enabled: bool,
    pub autoplay: bool,
    /// Navigation overrides applied to every node
    pub navigation: NavigationOverrides,
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl PlayerConfig {
    /// Load configuration from `.env`, the environment and the first CLI argument.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let arg = env::args().nth(1);
        Self::from_lookup(|key| env::var(key).ok(), arg)
    }

    /// Build from an arbitrary variable source. `arg` wins over
    /// `STORYWEB_ADVENTURE` for the adventure path.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        arg: Option<String>,
    ) -> Result<Self> {
        let adventure_path = arg
            .or_else(|| lookup("STORYWEB_ADVENTURE"))
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .context("pass an adventure JSON path or set STORYWEB_ADVENTURE")?;

        let media_base_url = lookup("STORYWEB_MEDIA_BASE_URL")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                let raw = if raw.ends_with('/') { raw } else { format!("{raw}/") };
                Url::parse(&raw)
            })
            .transpose()
            .context("STORYWEB_MEDIA_BASE_URL must be an absolute URL")?;

        let crossfade_ms = lookup("STORYWEB_CROSSFADE_MS")
            .map(|raw| raw.trim().parse::<u64>())
            .transpose()
            .context("STORYWEB_CROSSFADE_MS must be a whole number of milliseconds")?
            .unwrap_or(DEFAULT_CROSSFADE_MS);

        // An explicit mute wins over the sound switch
        let sound_enabled = match lookup("STORYWEB_MUTE") {
            Some(mute) => !is_truthy(&mute),
            None => lookup("STORYWEB_SOUND").map_or(true, |sound| is_truthy(&sound)),
        };

        let autoplay = lookup("STORYWEB_AUTOPLAY").map_or(true, |raw| is_truthy(&raw));

        let mut navigation = NavigationOverrides::default();
        let nav_style = lookup("STORYWEB_NAV_STYLE").map(serde_json::Value::String);
        if let Some(style) = normalize_nav_style(nav_style.as_ref()) {
            navigation = navigation.with_style(style);
        }
        if lookup("STORYWEB_BOTTOM_NAV").is_some_and(|raw| is_truthy(&raw)) {
            navigation = navigation.with_bottom();
        }
        if let Some(show_current) = lookup("STORYWEB_SHOW_CURRENT") {
            navigation = navigation.with_show_current(is_truthy(&show_current));
        }
        if lookup("STORYWEB_HIDE_VISITED").is_some_and(|raw| is_truthy(&raw)) {
            navigation = navigation.with_hide_visited();
        }

        Ok(Self {
            adventure_path,
            media_base_url,
            crossfade_ms,
            sound_enabled,
            autoplay,
            navigation,
        })
    }
}

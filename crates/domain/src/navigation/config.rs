//! Per-node navigation configuration read from the node property bag.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value_objects::prop_keys;
use crate::PropertyBag;

/// How navigation buttons are laid out for a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavStyle {
    #[default]
    Default,
    Right,
    Leftright,
    NoButtons,
    Swipe,
    SwipeWithButton,
    Scrollytell,
}

impl NavStyle {
    /// Styles that render every item; the rest drop the leading one.
    fn renders_first_item(self) -> bool {
        matches!(
            self,
            Self::Default | Self::SwipeWithButton | Self::Scrollytell
        )
    }

    pub fn is_swipe(self) -> bool {
        matches!(self, Self::Swipe | Self::SwipeWithButton)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavPlacement {
    #[default]
    Inline,
    Bottom,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationConfig {
    pub style: NavStyle,
    pub placement: NavPlacement,
    pub show_current: bool,
    /// Custom button order; `-1` stands for the synthetic "current" item
    pub ordered_ids: Vec<i64>,
    /// Leading items dropped before buttons are built
    pub skip_count: usize,
    pub hide_visited: bool,
    pub swipe_mode: bool,
}

/// Viewer-level switches layered over the node's own settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationOverrides {
    pub style: Option<NavStyle>,
    pub bottom: bool,
    pub show_current: Option<bool>,
    pub hide_visited: bool,
}

impl NavigationOverrides {
    pub fn with_style(mut self, style: NavStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_bottom(mut self) -> Self {
        self.bottom = true;
        self
    }

    pub fn with_show_current(mut self, show_current: bool) -> Self {
        self.show_current = Some(show_current);
        self
    }

    pub fn with_hide_visited(mut self) -> Self {
        self.hide_visited = true;
        self
    }
}

/// Normalize a raw style value. `None` when absent or blank.
pub fn normalize_nav_style(raw: Option<&Value>) -> Option<NavStyle> {
    let text = match raw? {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().find_map(|item| item.as_str())?.to_string(),
        other => other.to_string(),
    };
    let key = text.trim().to_lowercase();
    let style = match key.as_str() {
        "" => return None,
        "right" => NavStyle::Right,
        "leftright" | "left-right" | "left_right" => NavStyle::Leftright,
        "nobuttons" | "no-buttons" | "no" => NavStyle::NoButtons,
        "swipewithbutton" | "swipe-with-button" => NavStyle::SwipeWithButton,
        "swipe" => NavStyle::Swipe,
        "scrollytell" | "scrolly" | "scroll-tell" | "scrolly-tell" | "scrollytelling" => {
            NavStyle::Scrollytell
        }
        _ => NavStyle::Default,
    };
    Some(style)
}

fn parse_ordered_ids(props: &PropertyBag) -> Vec<i64> {
    props
        .tokens(prop_keys::ORDERED_LINK_IDS)
        .iter()
        .filter_map(|token| {
            token.parse::<i64>().ok().or_else(|| {
                token
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        })
        .collect()
}

/// Build the navigation config for a node from its props and overrides.
pub fn build_navigation_config(
    props: &PropertyBag,
    overrides: NavigationOverrides,
) -> NavigationConfig {
    let settings = props.lowercase_tokens(prop_keys::NAVIGATION_SETTINGS);
    let has_setting = |name: &str| settings.iter().any(|token| token == name);

    let style = overrides
        .style
        .or_else(|| normalize_nav_style(props.read(prop_keys::NAVIGATION_STYLE)))
        .unwrap_or_default();

    let placement = if overrides.bottom || has_setting("bottom-navigation") {
        NavPlacement::Bottom
    } else {
        NavPlacement::Inline
    };

    NavigationConfig {
        style,
        placement,
        show_current: overrides
            .show_current
            .unwrap_or_else(|| has_setting("show-current-node")),
        ordered_ids: parse_ordered_ids(props),
        skip_count: if style.renders_first_item() { 0 } else { 1 },
        hide_visited: overrides.hide_visited || has_setting("hide-visited"),
        swipe_mode: style.is_swipe(),
    }
}

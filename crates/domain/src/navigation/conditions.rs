//! Link conditioning: when a choice is hidden or dimmed based on the
//! visited set and on node/link properties.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::value_objects::{alpha_percent, pick_first_string, prop_keys};
use crate::{Node, NodeId, PropertyBag};

const DEFAULT_CONDITION_ALPHA: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionedMode {
    Hide,
    Dim,
}

/// Node-level presentation of conditioned links.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionedStyle {
    pub mode: ConditionedMode,
    /// 0..1, only set for transparency-type conditions
    pub opacity: Option<f64>,
    pub background_color: Option<String>,
}

/// Visual override carried by a dimmed navigation button.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// True when the link should be treated as conditioned for this visit.
///
/// A positive list is satisfied only once every listed node is visited; a
/// negative list conditions the link once all its nodes are visited.
/// Otherwise a visited target whose merged props carry `hide_visited` in
/// its node conditions conditions the link.
pub fn is_link_conditioned(
    link_props: &PropertyBag,
    target: Option<&Node>,
    visited: &HashSet<NodeId>,
) -> bool {
    let positive = link_props.node_ids(prop_keys::POSITIVE_NODE_LIST);
    if positive.iter().any(|id| !visited.contains(id)) {
        return true;
    }
    let negative = link_props.node_ids(prop_keys::NEGATIVE_NODE_LIST);
    if !negative.is_empty() && negative.iter().all(|id| visited.contains(id)) {
        return true;
    }

    let Some(target) = target else {
        return false;
    };
    if !visited.contains(&target.node_id) {
        return false;
    }
    target
        .merged_props()
        .lowercase_tokens(prop_keys::NODE_CONDITIONS)
        .iter()
        .any(|token| token == "hide_visited")
}

/// Read the node's conditioned-link presentation.
///
/// `mode_override` forces the mode (and opacity) regardless of the
/// configured condition type.
pub fn resolve_conditioned_style(
    props: &PropertyBag,
    mode_override: Option<ConditionedMode>,
) -> ConditionedStyle {
    let type_token = props
        .tokens(prop_keys::CONDITION_TYPE)
        .first()
        .map(|token| token.to_lowercase())
        .unwrap_or_default();

    let default_mode = if type_token.contains("hide") {
        ConditionedMode::Hide
    } else {
        ConditionedMode::Dim
    };
    let apply_opacity = type_token.contains("trans")
        || type_token.is_empty()
        || mode_override == Some(ConditionedMode::Dim);
    let alpha = alpha_percent(
        props.read(prop_keys::CONDITION_ALPHA),
        DEFAULT_CONDITION_ALPHA,
    );

    ConditionedStyle {
        mode: mode_override.unwrap_or(default_mode),
        opacity: apply_opacity.then_some(alpha / 100.0),
        background_color: props
            .read(prop_keys::CONDITION_COLOR)
            .and_then(pick_first_string),
    }
}

/// Per-link `conditionBehavior`: `hide`, or `dim`/`transparency`.
pub fn resolve_link_condition_behavior_override(link_props: &PropertyBag) -> Option<ConditionedMode> {
    let token = link_props
        .first_string(prop_keys::CONDITION_BEHAVIOR)?
        .to_lowercase();
    match token.as_str() {
        "hide" => Some(ConditionedMode::Hide),
        "dim" | "transparency" => Some(ConditionedMode::Dim),
        _ => None,
    }
}

/// Button style for dimmed links; `None` for hide mode or an empty style.
pub fn build_conditioned_button_style(style: &ConditionedStyle) -> Option<ButtonStyle> {
    if style.mode != ConditionedMode::Dim {
        return None;
    }
    if style.opacity.is_none() && style.background_color.is_none() {
        return None;
    }
    Some(ButtonStyle {
        opacity: style.opacity,
        background_color: style.background_color.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn visited(ids: &[i64]) -> HashSet<NodeId> {
        ids.iter().copied().map(NodeId::new).collect()
    }

    #[test]
    fn test_positive_list_requires_every_node_visited() {
        let props = PropertyBag::new().with("positiveNodeList", "1, 2");
        assert!(is_link_conditioned(&props, None, &visited(&[1])));
        assert!(!is_link_conditioned(&props, None, &visited(&[1, 2])));
    }

    #[test]
    fn test_negative_list_conditions_once_all_visited() {
        let props = PropertyBag::new().with("negative_nodes", json!([3, "#4"]));
        assert!(!is_link_conditioned(&props, None, &visited(&[3])));
        assert!(is_link_conditioned(&props, None, &visited(&[3, 4])));
    }

    #[test]
    fn test_hide_visited_target() {
        let target = Node::new(5, "Target").with_prop("nodeConditions", "HIDE_VISITED");
        let empty = PropertyBag::new();
        assert!(!is_link_conditioned(&empty, Some(&target), &visited(&[])));
        assert!(is_link_conditioned(&empty, Some(&target), &visited(&[5])));

        let plain = Node::new(6, "Plain");
        assert!(!is_link_conditioned(&empty, Some(&plain), &visited(&[6])));
    }

    #[test]
    fn test_conditioned_style_defaults_to_dim_with_alpha_40() {
        let style = resolve_conditioned_style(&PropertyBag::new(), None);
        assert_eq!(style.mode, ConditionedMode::Dim);
        assert_eq!(style.opacity, Some(0.4));
        assert_eq!(style.background_color, None);
    }

    #[test]
    fn test_conditioned_style_hide_type() {
        let props = PropertyBag::new()
            .with("type_nodeconditions", "hide")
            .with("alpha_nodeconditions", "70");
        let style = resolve_conditioned_style(&props, None);
        assert_eq!(style.mode, ConditionedMode::Hide);
        assert_eq!(style.opacity, None);
        assert!(build_conditioned_button_style(&style).is_none());

        let forced = resolve_conditioned_style(&props, Some(ConditionedMode::Dim));
        assert_eq!(forced.mode, ConditionedMode::Dim);
        assert_eq!(forced.opacity, Some(0.7));
    }

    #[test]
    fn test_conditioned_style_color_only() {
        let props = PropertyBag::new()
            .with("typeNodeconditions", "color")
            .with("color_nodeconditions", json!(["", "#ff0000"]));
        let style = resolve_conditioned_style(&props, None);
        assert_eq!(style.opacity, None);
        assert_eq!(
            build_conditioned_button_style(&style),
            Some(ButtonStyle {
                opacity: None,
                background_color: Some("#ff0000".into())
            })
        );
    }

    #[test]
    fn test_link_behavior_override() {
        let read = |value: &str| {
            resolve_link_condition_behavior_override(&PropertyBag::new().with("condition_behavior", value))
        };
        assert_eq!(read("Hide"), Some(ConditionedMode::Hide));
        assert_eq!(read("transparency"), Some(ConditionedMode::Dim));
        assert_eq!(read("other"), None);
        assert_eq!(resolve_link_condition_behavior_override(&PropertyBag::new()), None);
    }
}

//! Navigation model: the ordered, filtered buttons shown for a node plus
//! the primary (keyboard/swipe default) link.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::conditions::{
    build_conditioned_button_style, is_link_conditioned, resolve_conditioned_style,
    resolve_link_condition_behavior_override, ButtonStyle, ConditionedMode,
};
use super::config::{NavStyle, NavigationConfig};
use super::helpers::{resolve_navigation_label, resolve_navigation_target_id};
use crate::graph::GraphIndex;
use crate::{Link, LinkId, Node, NodeId, PropertyBag};

const CURRENT_ORDER_KEY: i64 = -1;

/// Node lookup used while building buttons.
pub trait NodeLookup {
    fn lookup(&self, node_id: NodeId) -> Option<&Node>;
}

impl NodeLookup for GraphIndex {
    fn lookup(&self, node_id: NodeId) -> Option<&Node> {
        self.node(node_id)
    }
}

impl NodeLookup for HashMap<NodeId, Node> {
    fn lookup(&self, node_id: NodeId) -> Option<&Node> {
        self.get(&node_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationButton {
    pub key: String,
    pub label: String,
    pub link_id: Option<LinkId>,
    pub target_node_id: Option<NodeId>,
    pub disabled: bool,
    pub is_broken: bool,
    pub is_current: bool,
    pub is_conditioned: bool,
    pub conditioned_mode: Option<ConditionedMode>,
    pub style: Option<ButtonStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationModel {
    pub buttons: Vec<NavigationButton>,
    pub primary_link_id: Option<LinkId>,
}

/// Everything the builder reads for one node.
pub struct NavigationInput<'a, L: NodeLookup + ?Sized> {
    pub current_node: Option<&'a Node>,
    pub current_node_id: Option<NodeId>,
    pub current_node_props: &'a PropertyBag,
    /// Candidate links in document order
    pub links: &'a [&'a Link],
    pub config: &'a NavigationConfig,
    pub nodes: &'a L,
    pub visited: &'a HashSet<NodeId>,
}

/// Per-link facts computed once per build.
struct LinkInfo<'a> {
    link: &'a Link,
    target_node_id: Option<NodeId>,
    target: Option<&'a Node>,
    conditioned: bool,
    override_mode: Option<ConditionedMode>,
}

impl LinkInfo<'_> {
    fn is_broken(&self) -> bool {
        self.target_node_id.is_none() || self.target.is_none()
    }
}

enum NavItem<'a> {
    Link(LinkInfo<'a>),
    Current,
}

impl NavItem<'_> {
    fn order_key(&self) -> i64 {
        match self {
            Self::Link(info) => info.link.link_id.get(),
            Self::Current => CURRENT_ORDER_KEY,
        }
    }
}

/// Stable reorder: ids from `order` first (each once, unknown ids skipped),
/// then every item whose id was not listed, in original order.
pub fn apply_order<T>(items: Vec<T>, order: &[i64], key: impl Fn(&T) -> i64) -> Vec<T> {
    if order.is_empty() {
        return items;
    }

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut used = HashSet::new();
    let mut ordered = Vec::with_capacity(slots.len());

    for &id in order {
        if used.contains(&id) {
            continue;
        }
        let found = slots
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|item| key(item) == id))
            .and_then(Option::take);
        if let Some(item) = found {
            ordered.push(item);
            used.insert(id);
        }
    }

    ordered.extend(
        slots
            .into_iter()
            .flatten()
            .filter(|item| !used.contains(&key(item))),
    );
    ordered
}

/// Build the navigation model with the default link-condition predicate.
pub fn build_navigation_model<L: NodeLookup + ?Sized>(
    input: &NavigationInput<'_, L>,
) -> NavigationModel {
    build_navigation_model_with(input, is_link_conditioned)
}

/// Build the navigation model with a custom link-condition predicate.
pub fn build_navigation_model_with<'a, L, C>(
    input: &NavigationInput<'a, L>,
    is_conditioned: C,
) -> NavigationModel
where
    L: NodeLookup + ?Sized,
    C: Fn(&PropertyBag, Option<&Node>, &HashSet<NodeId>) -> bool,
{
    let config = input.config;
    let conditioned_config = resolve_conditioned_style(input.current_node_props, None);
    let dim_style = if conditioned_config.mode == ConditionedMode::Dim {
        build_conditioned_button_style(&conditioned_config)
    } else {
        build_conditioned_button_style(&resolve_conditioned_style(
            input.current_node_props,
            Some(ConditionedMode::Dim),
        ))
    };

    let mut base: Vec<NavItem<'a>> = input
        .links
        .iter()
        .map(|&link| {
            let target_node_id = resolve_navigation_target_id(link, input.current_node_id);
            let target = target_node_id.and_then(|id| input.nodes.lookup(id));
            NavItem::Link(LinkInfo {
                link,
                target_node_id,
                target,
                conditioned: is_conditioned(&link.props, target, input.visited),
                override_mode: resolve_link_condition_behavior_override(&link.props),
            })
        })
        .collect();
    if config.show_current && input.current_node.is_some() {
        base.push(NavItem::Current);
    }

    let items = apply_order(base, &config.ordered_ids, NavItem::order_key);

    let conditioned_mode = |info: &LinkInfo<'_>| -> Option<ConditionedMode> {
        info.conditioned
            .then(|| info.override_mode.unwrap_or(conditioned_config.mode))
    };
    let is_hidden = |info: &LinkInfo<'_>| -> bool {
        let visited_target = info
            .target_node_id
            .is_some_and(|id| input.visited.contains(&id));
        (config.hide_visited && visited_target)
            || conditioned_mode(info) == Some(ConditionedMode::Hide)
    };

    let primary_link_id = items.iter().find_map(|item| match item {
        NavItem::Link(info) if !is_hidden(info) && !info.is_broken() => Some(info.link.link_id),
        _ => None,
    });

    if config.style == NavStyle::NoButtons {
        return NavigationModel {
            buttons: Vec::new(),
            primary_link_id,
        };
    }

    let mut buttons: Vec<NavigationButton> = Vec::new();
    for item in items.iter().skip(config.skip_count) {
        let info = match item {
            NavItem::Current => {
                let label = input
                    .current_node
                    .map(|node| node.title.as_str())
                    .filter(|title| !title.is_empty())
                    .unwrap_or("Current node");
                buttons.push(NavigationButton {
                    key: "current".to_string(),
                    label: label.to_string(),
                    is_current: true,
                    ..NavigationButton::default()
                });
                continue;
            }
            NavItem::Link(info) => info,
        };
        if is_hidden(info) {
            continue;
        }

        let label = resolve_navigation_label(info.link, input.current_node_id)
            .or_else(|| {
                info.target
                    .map(|node| node.title.clone())
                    .filter(|title| !title.is_empty())
            })
            .unwrap_or_else(|| format!("Continue {}", buttons.len() + 1));
        let mode = conditioned_mode(info);
        let broken = info.is_broken();

        buttons.push(NavigationButton {
            key: info.link.link_id.to_string(),
            label,
            link_id: Some(info.link.link_id),
            target_node_id: info.target_node_id,
            disabled: broken,
            is_broken: broken,
            is_current: false,
            is_conditioned: info.conditioned,
            conditioned_mode: mode,
            style: if mode == Some(ConditionedMode::Dim) {
                dim_style.clone()
            } else {
                None
            },
        });
    }

    NavigationModel {
        buttons,
        primary_link_id,
    }
}

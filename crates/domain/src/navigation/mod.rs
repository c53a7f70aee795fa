//! Navigation buttons for the node currently shown.

mod conditions;
mod config;
mod helpers;
mod model;

pub use conditions::{
    build_conditioned_button_style, is_link_conditioned, resolve_conditioned_style,
    resolve_link_condition_behavior_override, ButtonStyle, ConditionedMode, ConditionedStyle,
};
pub use config::{
    build_navigation_config, normalize_nav_style, NavPlacement, NavStyle, NavigationConfig,
    NavigationOverrides,
};
pub use helpers::{resolve_navigation_label, resolve_navigation_target_id};
pub use model::{
    apply_order, build_navigation_model, build_navigation_model_with, NavigationButton,
    NavigationInput, NavigationModel, NodeLookup,
};

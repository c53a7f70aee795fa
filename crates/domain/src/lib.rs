extern crate self as storyweb_domain;

pub mod decisions;
pub mod entities;
pub mod error;
pub mod graph;
pub mod ids;
pub mod media;
pub mod navigation;
pub mod node_kind;
pub mod value_objects;

pub use entities::{Adventure, Link, Node, NodeImage};

pub use error::{DomainError, EngineError};

pub use ids::{LinkId, NodeId};

pub use graph::GraphIndex;
pub use node_kind::{resolve_node_kind, NodeKind};

pub use decisions::{decide_on_click, decide_on_enter_node, ClickDecision, EngineContext, EnterNodeDecision};

// Re-export value objects (explicit list in value_objects/mod.rs)
pub use value_objects::PropertyBag;

pub use media::{
    build_audio_source_config, resolve_node_media, AltBehavior, AudioSourceConfig, NodeMedia,
};
pub use navigation::{
    build_navigation_config, build_navigation_model, NavigationButton, NavigationConfig,
    NavigationInput, NavigationModel, NavigationOverrides,
};

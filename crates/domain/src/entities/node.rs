//! Node entity - a single screen/scene of the story graph
//!
//! Nodes are immutable snapshots supplied by the surrounding editor/store.
//! The player never mutates them; behavior is derived from the node `type`
//! and from the two property bags:
//! - `rawProps`: the open bag written by authoring tools (multi-spelling keys)
//! - `props`: an editor-normalized bag (`audioUrl`, `subtitlesUrl`, ...)

use serde::{Deserialize, Serialize};

use crate::{NodeId, PropertyBag};

/// Background image (or video) attached to a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeImage {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub layout_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub node_id: NodeId,
    #[serde(default)]
    pub title: String,
    /// Player-facing content, possibly HTML
    #[serde(default)]
    pub text: String,
    /// Generic node type, used when no chapter type is set
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub image: Option<NodeImage>,
    #[serde(default, alias = "kindProps")]
    pub raw_props: PropertyBag,
    #[serde(default)]
    pub props: PropertyBag,
}

impl Node {
    pub fn new(node_id: i64, title: impl Into<String>) -> Self {
        Self {
            node_id: NodeId::new(node_id),
            title: title.into(),
            text: String::new(),
            node_type: None,
            image: None,
            raw_props: PropertyBag::new(),
            props: PropertyBag::new(),
        }
    }

    // Builder methods

    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image = Some(NodeImage {
            url: Some(url.into()),
            layout_type: None,
        });
        self
    }

    pub fn with_raw_prop(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.raw_props.insert(key, value);
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.props.insert(key, value);
        self
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image.as_ref().and_then(|image| image.url.as_deref())
    }

    /// `rawProps` with `props` layered on top.
    pub fn merged_props(&self) -> PropertyBag {
        self.raw_props.merged(&self.props)
    }
}

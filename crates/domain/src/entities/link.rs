//! Link entity - a directed (or bidirectional) edge rendered as a player choice

use serde::{Deserialize, Serialize};

use crate::{LinkId, NodeId, PropertyBag};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Raw storage identifier; older documents carry it next to `linkId`
    #[serde(default)]
    pub id: Option<i64>,
    pub link_id: LinkId,
    #[serde(alias = "source")]
    pub from_node_id: NodeId,
    /// `None` means the link is broken
    #[serde(default, alias = "target")]
    pub to_node_id: Option<NodeId>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub source_title: Option<String>,
    #[serde(default)]
    pub target_title: Option<String>,
    #[serde(default, rename = "type")]
    pub link_type: Option<String>,
    /// Per-link conditioning properties
    #[serde(default)]
    pub props: PropertyBag,
}

impl Link {
    pub fn new(link_id: i64, from_node_id: i64, to_node_id: Option<i64>) -> Self {
        Self {
            id: None,
            link_id: LinkId::new(link_id),
            from_node_id: NodeId::new(from_node_id),
            to_node_id: to_node_id.map(NodeId::new),
            label: None,
            source_title: None,
            target_title: None,
            link_type: None,
            props: PropertyBag::new(),
        }
    }

    /// Shorthand for a link with a known target.
    pub fn between(link_id: i64, from_node_id: i64, to_node_id: i64) -> Self {
        Self::new(link_id, from_node_id, Some(to_node_id))
    }

    // Builder methods

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_source_title(mut self, title: impl Into<String>) -> Self {
        self.source_title = Some(title.into());
        self
    }

    pub fn with_type(mut self, link_type: impl Into<String>) -> Self {
        self.link_type = Some(link_type.into());
        self
    }

    pub fn with_raw_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.props.insert(key, value);
        self
    }

    pub fn is_bidirectional(&self) -> bool {
        self.link_type
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains("bidirectional"))
    }

    /// True when this bidirectional link should be walked backwards from `node_id`.
    pub fn is_reversed_at(&self, node_id: NodeId) -> bool {
        self.is_bidirectional() && self.to_node_id == Some(node_id)
    }
}

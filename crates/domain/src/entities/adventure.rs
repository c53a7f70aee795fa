//! Adventure aggregate - the flat document the player walks
//!
//! Loaded from the JSON shape produced by the authoring API. Everything the
//! engine does not consume (category, users, edit version...) is ignored.

use serde::{Deserialize, Serialize};

use crate::value_objects::prop_keys;
use crate::{DomainError, Link, Node, PropertyBag};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adventure {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub view_slug: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
    /// Adventure-level shared defaults (font list, menu options, ...)
    #[serde(default)]
    pub props: PropertyBag,
}

impl Adventure {
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Parse an adventure document.
    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        Ok(serde_json::from_str(raw)?)
    }

    // Builder methods

    pub fn with_view_slug(mut self, view_slug: impl Into<String>) -> Self {
        self.view_slug = view_slug.into();
        self
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    /// Primary slug, if set.
    pub fn slug(&self) -> Option<&str> {
        Some(self.slug.as_str()).filter(|s| !s.is_empty())
    }

    /// View slug, if set.
    pub fn view_slug(&self) -> Option<&str> {
        Some(self.view_slug.as_str()).filter(|s| !s.is_empty())
    }

    pub fn font_list(&self) -> Vec<String> {
        self.props.tokens(prop_keys::FONT_LIST)
    }
}

//! Node kind resolution
//!
//! Classifies a node into a small closed set of behavioral kinds. Matching is
//! ordered and substring-tolerant so legacy/variant type strings keep working
//! without a migration step.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::value_objects::prop_keys;
use crate::{DomainError, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Root,
    Random,
    Reference,
    ReferenceTab,
    Video,
    Chapter,
    Default,
    Unknown,
}

impl NodeKind {
    /// Both reference flavours (same tab and new tab).
    pub fn is_reference(self) -> bool {
        matches!(self, Self::Reference | Self::ReferenceTab)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Random => "random",
            Self::Reference => "reference",
            Self::ReferenceTab => "reference-tab",
            Self::Video => "video",
            Self::Chapter => "chapter",
            Self::Default => "default",
            Self::Unknown => "unknown",
        }
    }

    /// Match a normalized (lower-cased, trimmed) type token.
    fn from_type_key(key: &str) -> Self {
        match key {
            "root" | "start-node" => Self::Root,
            "random" | "random-node" => Self::Random,
            "ref-node-tab" | "reference-tab" => Self::ReferenceTab,
            _ if key.starts_with("ref-node") || key == "reference" => Self::Reference,
            _ if key.contains("video") => Self::Video,
            _ if key.contains("chapter") => Self::Chapter,
            "" => Self::Unknown,
            _ => Self::Default,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "root" => Ok(Self::Root),
            "random" => Ok(Self::Random),
            "reference" => Ok(Self::Reference),
            "reference-tab" => Ok(Self::ReferenceTab),
            "video" => Ok(Self::Video),
            "chapter" => Ok(Self::Chapter),
            "default" => Ok(Self::Default),
            "unknown" => Ok(Self::Unknown),
            other => Err(DomainError::parse(format!("Unknown node kind: {}", other))),
        }
    }
}

/// The chapter-type token from the property bag, if any spelling is set.
fn chapter_type(node: &Node) -> Option<String> {
    node.raw_props.first_string(prop_keys::CHAPTER_TYPE)
}

/// Resolve the behavioral kind of a node. A missing node is `Unknown`.
pub fn resolve_node_kind(node: Option<&Node>) -> NodeKind {
    let Some(node) = node else {
        return NodeKind::Unknown;
    };
    let raw = chapter_type(node).or_else(|| node.node_type.clone());
    let key = raw.unwrap_or_default().trim().to_lowercase();
    NodeKind::from_type_key(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of_type(node_type: &str) -> NodeKind {
        resolve_node_kind(Some(&Node::new(1, "n").with_type(node_type)))
    }

    #[test]
    fn test_kind_priority_order() {
        assert_eq!(kind_of_type("root"), NodeKind::Root);
        assert_eq!(kind_of_type(" Start-Node "), NodeKind::Root);
        assert_eq!(kind_of_type("random-node"), NodeKind::Random);
        assert_eq!(kind_of_type("ref-node-tab"), NodeKind::ReferenceTab);
        assert_eq!(kind_of_type("ref-node-external"), NodeKind::Reference);
        assert_eq!(kind_of_type("chapter-video"), NodeKind::Video);
        assert_eq!(kind_of_type("chapter-plain"), NodeKind::Chapter);
        assert_eq!(kind_of_type("anything"), NodeKind::Default);
        assert_eq!(kind_of_type("   "), NodeKind::Unknown);
    }

    #[test]
    fn test_chapter_type_wins_over_generic_type() {
        let node = Node::new(1, "n")
            .with_type("default")
            .with_raw_prop("settings_chaptertype", "Random");
        assert_eq!(resolve_node_kind(Some(&node)), NodeKind::Random);

        let from_array = Node::new(2, "n").with_raw_prop("chapter_type", serde_json::json!(["", "videochapter"]));
        assert_eq!(resolve_node_kind(Some(&from_array)), NodeKind::Video);
    }

    #[test]
    fn test_blank_chapter_type_falls_back_to_type() {
        let node = Node::new(1, "n")
            .with_type("root")
            .with_raw_prop("settings_chapterType", "  ");
        assert_eq!(resolve_node_kind(Some(&node)), NodeKind::Root);
    }

    #[test]
    fn test_missing_and_untyped_nodes_are_unknown() {
        assert_eq!(resolve_node_kind(None), NodeKind::Unknown);
        assert_eq!(resolve_node_kind(Some(&Node::new(1, "n"))), NodeKind::Unknown);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("RANDOM".parse::<NodeKind>().unwrap(), NodeKind::Random);
        assert!("sideways".parse::<NodeKind>().is_err());
        assert!(NodeKind::ReferenceTab.is_reference());
    }
}

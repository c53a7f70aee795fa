//! Graph index - O(1) lookups over a flat adventure document
//!
//! Rebuilt whenever the adventure changes. The index does not validate that
//! link endpoints exist; consumers treat a missing lookup as a broken link or
//! target rather than failing.

use std::collections::HashMap;

use crate::node_kind::{resolve_node_kind, NodeKind};
use crate::{Adventure, Link, LinkId, Node, NodeId};

#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    node_index: HashMap<NodeId, Node>,
    links_by_source: HashMap<NodeId, Vec<Link>>,
    links_by_id: HashMap<LinkId, Link>,
    /// Nodes and links in document order
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl GraphIndex {
    /// Build every lookup structure in one pass over nodes and links.
    ///
    /// `links_by_id` is keyed by `linkId` and then by the raw `id`, so when
    /// the two identifiers collide across links the later write wins.
    pub fn build(adventure: &Adventure) -> Self {
        let mut node_index = HashMap::with_capacity(adventure.nodes.len());
        for node in &adventure.nodes {
            node_index.insert(node.node_id, node.clone());
        }

        let mut links_by_source: HashMap<NodeId, Vec<Link>> = HashMap::new();
        let mut links_by_id = HashMap::with_capacity(adventure.links.len());
        for link in &adventure.links {
            links_by_source
                .entry(link.from_node_id)
                .or_default()
                .push(link.clone());
            links_by_id.insert(link.link_id, link.clone());
            if let Some(raw_id) = link.id {
                links_by_id.insert(LinkId::new(raw_id), link.clone());
            }
        }

        Self {
            node_index,
            links_by_source,
            links_by_id,
            nodes: adventure.nodes.clone(),
            links: adventure.links.clone(),
        }
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.node_index.get(&node_id)
    }

    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.node_index.contains_key(&node_id)
    }

    pub fn link(&self, link_id: LinkId) -> Option<&Link> {
        self.links_by_id.get(&link_id)
    }

    /// Outgoing links in document order; empty when the node has none.
    pub fn outgoing(&self, node_id: NodeId) -> &[Link] {
        self.links_by_source
            .get(&node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Links a player can follow from `node_id`: its outgoing links plus
    /// bidirectional links that end at it, in document order.
    pub fn navigation_links(&self, node_id: NodeId) -> Vec<&Link> {
        self.links
            .iter()
            .filter(|link| link.from_node_id == node_id || link.is_reversed_at(node_id))
            .collect()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First node resolving to the root kind, else the first node.
    pub fn root_node(&self) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|node| resolve_node_kind(Some(node)) == NodeKind::Root)
            .or_else(|| self.nodes.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Adventure {
        Adventure::new("demo", "Demo")
            .with_node(Node::new(1, "Intro"))
            .with_node(Node::new(2, "Start").with_type("root"))
            .with_node(Node::new(3, "End"))
            .with_link(Link::between(10, 2, 1))
            .with_link(Link::between(11, 2, 3))
            .with_link(Link::between(12, 3, 1).with_type("bidirectional"))
            .with_link(Link::new(13, 1, None))
    }

    #[test]
    fn test_empty_adventure_yields_empty_index() {
        let index = GraphIndex::build(&Adventure::default());
        assert!(index.is_empty());
        assert!(index.outgoing(NodeId::new(1)).is_empty());
        assert!(index.link(LinkId::new(1)).is_none());
        assert!(index.root_node().is_none());
    }

    #[test]
    fn test_links_grouped_by_source_in_order() {
        let index = GraphIndex::build(&sample());
        let ids: Vec<_> = index
            .outgoing(NodeId::new(2))
            .iter()
            .map(|l| l.link_id.get())
            .collect();
        assert_eq!(ids, vec![10, 11]);
        assert_eq!(index.outgoing(NodeId::new(1)).len(), 1);
    }

    #[test]
    fn test_links_indexed_by_raw_id_too() {
        let adventure = Adventure::default().with_link(Link::between(5, 1, 2).with_raw_id(500));
        let index = GraphIndex::build(&adventure);
        assert_eq!(index.link(LinkId::new(5)).map(|l| l.link_id.get()), Some(5));
        assert_eq!(index.link(LinkId::new(500)).map(|l| l.link_id.get()), Some(5));
    }

    #[test]
    fn test_raw_id_collision_last_write_wins() {
        let adventure = Adventure::default()
            .with_link(Link::between(1, 1, 2))
            .with_link(Link::between(2, 1, 3).with_raw_id(1));
        let index = GraphIndex::build(&adventure);
        assert_eq!(index.link(LinkId::new(1)).map(|l| l.link_id.get()), Some(2));
    }

    #[test]
    fn test_navigation_links_include_reversed_bidirectional() {
        let index = GraphIndex::build(&sample());
        let ids: Vec<_> = index
            .navigation_links(NodeId::new(1))
            .iter()
            .map(|l| l.link_id.get())
            .collect();
        assert_eq!(ids, vec![12, 13]);
    }

    #[test]
    fn test_root_node_prefers_root_kind() {
        let index = GraphIndex::build(&sample());
        assert_eq!(index.root_node().map(|n| n.node_id), Some(NodeId::new(2)));

        let untyped = Adventure::default().with_node(Node::new(7, "Only"));
        let index = GraphIndex::build(&untyped);
        assert_eq!(index.root_node().map(|n| n.node_id), Some(NodeId::new(7)));
    }
}

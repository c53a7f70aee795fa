//! Enter/click decisions for a single node visit
//!
//! Given a node id or a link id, decide whether the player renders a node,
//! follows an automatic redirect (random nodes) or reports a graph error.
//! All failures come back as [`EngineError`] values.
//!
//! Randomness is injected: callers pass `pick(len) -> index` so the policy
//! stays deterministic under test. Out-of-range picks are clamped.

use std::collections::HashSet;

use serde::Serialize;

use crate::graph::GraphIndex;
use crate::node_kind::{resolve_node_kind, NodeKind};
use crate::{EngineError, Link, LinkId, NodeId};

/// Everything a decision needs: the graph and the session's visited set.
#[derive(Debug, Clone, Copy)]
pub struct EngineContext<'a> {
    pub graph: &'a GraphIndex,
    pub visited: &'a HashSet<NodeId>,
}

impl<'a> EngineContext<'a> {
    pub fn new(graph: &'a GraphIndex, visited: &'a HashSet<NodeId>) -> Self {
        Self { graph, visited }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EnterNodeDecision {
    /// Render this node as-is
    #[serde(rename_all = "camelCase")]
    Show { node_id: NodeId, node_kind: NodeKind },
    /// Never render; continue through `via_link_id` immediately
    #[serde(rename_all = "camelCase")]
    Auto {
        node_id: NodeId,
        node_kind: NodeKind,
        via_link_id: LinkId,
        target_node_id: NodeId,
    },
    #[serde(rename_all = "camelCase")]
    Error {
        error: EngineError,
        node_id: Option<NodeId>,
        node_kind: Option<NodeKind>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClickDecision {
    #[serde(rename_all = "camelCase")]
    Move { node_id: NodeId, link_id: LinkId },
    Error { error: EngineError },
}

impl EnterNodeDecision {
    fn error(error: EngineError, node_id: Option<NodeId>, node_kind: Option<NodeKind>) -> Self {
        Self::Error {
            error,
            node_id,
            node_kind,
        }
    }
}

impl ClickDecision {
    fn error(error: EngineError) -> Self {
        Self::Error { error }
    }
}

/// Pick one outgoing link of a random node.
///
/// Only links whose target exists count; self-loops are dropped (leaving
/// nothing is an error even when self-loops existed). Unvisited targets are
/// preferred; when every target is visited the whole non-self pool is used.
fn pick_random_link<'g>(
    node_id: NodeId,
    ctx: &EngineContext<'g>,
    pick: impl FnOnce(usize) -> usize,
) -> Option<&'g Link> {
    let pool: Vec<&Link> = ctx
        .graph
        .outgoing(node_id)
        .iter()
        .filter(|link| {
            link.to_node_id
                .is_some_and(|target| ctx.graph.contains_node(target) && target != node_id)
        })
        .collect();
    if pool.is_empty() {
        return None;
    }

    let unvisited: Vec<&Link> = pool
        .iter()
        .copied()
        .filter(|link| {
            link.to_node_id
                .is_some_and(|target| !ctx.visited.contains(&target))
        })
        .collect();
    let candidates = if unvisited.is_empty() { pool } else { unvisited };

    let index = pick(candidates.len()).min(candidates.len() - 1);
    candidates.get(index).copied()
}

/// Decide what happens when the player enters `node_id`.
pub fn decide_on_enter_node(
    node_id: NodeId,
    ctx: &EngineContext<'_>,
    pick: impl FnOnce(usize) -> usize,
) -> EnterNodeDecision {
    let Some(node) = ctx.graph.node(node_id) else {
        return EnterNodeDecision::error(EngineError::missing_node(), None, None);
    };
    let node_kind = resolve_node_kind(Some(node));

    if node_kind != NodeKind::Random {
        return EnterNodeDecision::Show { node_id, node_kind };
    }

    match pick_random_link(node_id, ctx, pick) {
        Some(Link {
            link_id,
            to_node_id: Some(target_node_id),
            ..
        }) => EnterNodeDecision::Auto {
            node_id,
            node_kind,
            via_link_id: *link_id,
            target_node_id: *target_node_id,
        },
        _ => EnterNodeDecision::error(
            EngineError::random_node_without_targets(),
            Some(node_id),
            Some(node_kind),
        ),
    }
}

/// Decide what happens when the player clicks `link_id`.
pub fn decide_on_click(link_id: LinkId, ctx: &EngineContext<'_>) -> ClickDecision {
    let Some(link) = ctx.graph.link(link_id) else {
        return ClickDecision::error(EngineError::missing_link());
    };
    let Some(target_id) = link.to_node_id else {
        return ClickDecision::error(EngineError::link_without_destination());
    };
    let Some(target) = ctx.graph.node(target_id) else {
        return ClickDecision::error(EngineError::missing_target_node());
    };
    ClickDecision::Move {
        node_id: target.node_id,
        link_id: link.link_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Adventure, Link, Node};

    fn random_adventure(links: Vec<Link>) -> GraphIndex {
        let mut adventure = Adventure::new("demo", "Demo")
            .with_node(Node::new(1, "Random").with_type("random"))
            .with_node(Node::new(2, "Two"))
            .with_node(Node::new(3, "Three"));
        adventure.links = links;
        GraphIndex::build(&adventure)
    }

    /// Cycles through every index so repeated trials cover the whole pool.
    fn trial_picks() -> impl Iterator<Item = usize> {
        0..64
    }

    #[test]
    fn test_non_random_nodes_are_shown_unchanged() {
        let graph = random_adventure(vec![]);
        let visited = HashSet::new();
        let ctx = EngineContext::new(&graph, &visited);
        for id in [2, 3] {
            let decision = decide_on_enter_node(NodeId::new(id), &ctx, |_| 0);
            assert_eq!(
                decision,
                EnterNodeDecision::Show {
                    node_id: NodeId::new(id),
                    node_kind: NodeKind::Unknown
                }
            );
        }
    }

    #[test]
    fn test_missing_node_is_error() {
        let graph = random_adventure(vec![]);
        let visited = HashSet::new();
        let ctx = EngineContext::new(&graph, &visited);
        match decide_on_enter_node(NodeId::new(99), &ctx, |_| 0) {
            EnterNodeDecision::Error { error, .. } => assert_eq!(error.title, "Missing node"),
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_random_pick_prefers_only_unvisited_non_self_target() {
        // A->1 (self), A->2 (unvisited), A->3 (visited)
        let graph = random_adventure(vec![
            Link::between(10, 1, 3),
            Link::between(11, 1, 2),
            Link::between(12, 1, 1),
        ]);
        let visited: HashSet<_> = [NodeId::new(3)].into_iter().collect();
        let ctx = EngineContext::new(&graph, &visited);

        for pick in trial_picks() {
            let decision = decide_on_enter_node(NodeId::new(1), &ctx, |_| pick);
            assert_eq!(
                decision,
                EnterNodeDecision::Auto {
                    node_id: NodeId::new(1),
                    node_kind: NodeKind::Random,
                    via_link_id: LinkId::new(11),
                    target_node_id: NodeId::new(2),
                }
            );
        }
    }

    #[test]
    fn test_random_pick_falls_back_to_visited_pool() {
        let graph = random_adventure(vec![Link::between(10, 1, 2), Link::between(11, 1, 3)]);
        let visited: HashSet<_> = [NodeId::new(2), NodeId::new(3)].into_iter().collect();
        let ctx = EngineContext::new(&graph, &visited);

        let mut seen = HashSet::new();
        for pick in trial_picks() {
            let len_seen = std::cell::Cell::new(0);
            let decision = decide_on_enter_node(NodeId::new(1), &ctx, |len| {
                len_seen.set(len);
                pick % len
            });
            assert_eq!(len_seen.get(), 2);
            if let EnterNodeDecision::Auto { target_node_id, .. } = decision {
                seen.insert(target_node_id);
            }
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_random_node_with_only_self_loop_is_error() {
        let graph = random_adventure(vec![Link::between(10, 1, 1)]);
        let visited = HashSet::new();
        let ctx = EngineContext::new(&graph, &visited);
        match decide_on_enter_node(NodeId::new(1), &ctx, |_| 0) {
            EnterNodeDecision::Error {
                error,
                node_id,
                node_kind,
            } => {
                assert_eq!(error.title, "Random node error");
                assert_eq!(node_id, Some(NodeId::new(1)));
                assert_eq!(node_kind, Some(NodeKind::Random));
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_random_node_ignores_broken_and_dangling_links() {
        let graph = random_adventure(vec![
            Link::new(10, 1, None),
            Link::between(11, 1, 42),
            Link::between(12, 1, 3),
        ]);
        let visited = HashSet::new();
        let ctx = EngineContext::new(&graph, &visited);
        let decision = decide_on_enter_node(NodeId::new(1), &ctx, |len| len + 5);
        assert!(matches!(
            decision,
            EnterNodeDecision::Auto { via_link_id, .. } if via_link_id == LinkId::new(12)
        ));
    }

    #[test]
    fn test_click_errors_are_distinct() {
        let graph = random_adventure(vec![Link::new(10, 2, None), Link::between(11, 2, 77)]);
        let visited = HashSet::new();
        let ctx = EngineContext::new(&graph, &visited);

        let description = |decision: ClickDecision| match decision {
            ClickDecision::Error { error } => {
                assert_eq!(error.title, "Broken link");
                error.description.unwrap_or_default()
            }
            other => panic!("unexpected decision: {:?}", other),
        };

        assert!(description(decide_on_click(LinkId::new(999), &ctx)).contains("missing"));
        assert!(description(decide_on_click(LinkId::new(10), &ctx)).contains("destination"));
        assert!(description(decide_on_click(LinkId::new(11), &ctx)).contains("target node"));
    }

    #[test]
    fn test_click_moves_to_target() {
        let graph = random_adventure(vec![Link::between(10, 2, 3).with_raw_id(1000)]);
        let visited = HashSet::new();
        let ctx = EngineContext::new(&graph, &visited);
        assert_eq!(
            decide_on_click(LinkId::new(1000), &ctx),
            ClickDecision::Move {
                node_id: NodeId::new(3),
                link_id: LinkId::new(10)
            }
        );
    }

    #[test]
    fn test_decision_serializes_with_type_tag() {
        let decision = ClickDecision::Move {
            node_id: NodeId::new(3),
            link_id: LinkId::new(10),
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["type"], "move");
        assert_eq!(json["nodeId"], 3);
        assert_eq!(json["linkId"], 10);
    }
}

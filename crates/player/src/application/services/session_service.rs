//! Player session - walks the story graph for one reader
//!
//! The session owns the current node, the history stack and the visited set.
//! Every transition goes through the decision engine, so random nodes are
//! redirected before anything is shown and broken links surface as
//! [`EngineError`] values instead of moving the reader.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use storyweb_domain::{
    build_audio_source_config, build_navigation_config, build_navigation_model, decide_on_click,
    decide_on_enter_node, resolve_node_kind, resolve_node_media, Adventure, AudioSourceConfig,
    ClickDecision, EngineContext, EngineError, EnterNodeDecision, GraphIndex, LinkId,
    NavigationInput, NavigationModel, NavigationOverrides, Node, NodeId, NodeKind, NodeMedia,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::ports::outbound::RandomPort;

/// Upper bound on chained random-node redirects for one transition.
pub const DEFAULT_MAX_REDIRECTS: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session has not been started")]
    NotStarted,

    #[error("Adventure has no nodes")]
    NoNodes,

    #[error("Random nodes keep redirecting, starting from node {0}")]
    RedirectLoop(NodeId),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl SessionError {
    /// The user-facing graph error, if this is one.
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            Self::Engine(error) => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub node_id: NodeId,
    pub chosen_link_id: Option<LinkId>,
}

/// Where a transition landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub node_id: NodeId,
    pub node_kind: NodeKind,
    /// Links followed automatically through random nodes, in order
    pub redirected_via: Vec<LinkId>,
}

pub struct PlayerSession {
    adventure: Adventure,
    graph: GraphIndex,
    random: Arc<dyn RandomPort>,
    current: Option<NodeId>,
    history: Vec<HistoryEntry>,
    visited: HashSet<NodeId>,
    max_redirects: usize,
}

impl PlayerSession {
    pub fn new(adventure: Adventure, random: Arc<dyn RandomPort>) -> Self {
        let graph = GraphIndex::build(&adventure);
        Self {
            adventure,
            graph,
            random,
            current: None,
            history: Vec::new(),
            visited: HashSet::new(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn adventure(&self) -> &Adventure {
        &self.adventure
    }

    pub fn graph(&self) -> &GraphIndex {
        &self.graph
    }

    pub fn root_node_id(&self) -> Option<NodeId> {
        self.graph.root_node().map(|node| node.node_id)
    }

    pub fn current_node_id(&self) -> Option<NodeId> {
        self.current
    }

    pub fn current_node(&self) -> Option<&Node> {
        self.current.and_then(|node_id| self.graph.node(node_id))
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn visited(&self) -> &HashSet<NodeId> {
        &self.visited
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Share of nodes visited, 0..=100.
    pub fn progress_percent(&self) -> u8 {
        let total = self.graph.node_count();
        if total == 0 {
            return 0;
        }
        let percent = (self.visited.len() as f64 / total as f64 * 100.0).round();
        percent.min(100.0) as u8
    }

    /// Enter the root node with a fresh history.
    pub fn start(&mut self) -> Result<Transition, SessionError> {
        let root = self.root_node_id().ok_or(SessionError::NoNodes)?;
        info!(adventure = %self.adventure.title, root = %root, "Starting session");
        self.history.clear();
        self.visited.clear();
        self.enter(root, None)
    }

    /// Back to the root, forgetting history and visited nodes.
    pub fn go_home(&mut self) -> Result<Transition, SessionError> {
        if self.current.is_none() {
            return Err(SessionError::NotStarted);
        }
        self.start()
    }

    /// Follow `link_id` from the current node.
    pub fn choose_link(&mut self, link_id: LinkId) -> Result<Transition, SessionError> {
        let current = self.current.ok_or(SessionError::NotStarted)?;

        // Bidirectional links clicked from their target walk back to the source
        let reversed_source = self
            .graph
            .link(link_id)
            .filter(|link| link.is_reversed_at(current))
            .map(|link| link.from_node_id);
        if let Some(source) = reversed_source {
            if !self.graph.contains_node(source) {
                return Err(EngineError::missing_target_node().into());
            }
            debug!(link_id = %link_id, from = %current, to = %source, "Following reversed link");
            return self.enter(source, Some(link_id));
        }

        let decision = decide_on_click(link_id, &EngineContext::new(&self.graph, &self.visited));
        debug!(link_id = %link_id, ?decision, "Click decision");
        match decision {
            ClickDecision::Move { node_id, link_id } => self.enter(node_id, Some(link_id)),
            ClickDecision::Error { error } => Err(error.into()),
        }
    }

    /// Jump straight to `node_id`, as a menu or bookmark would.
    pub fn go_to_node(&mut self, node_id: NodeId) -> Result<Transition, SessionError> {
        if self.current.is_none() {
            return Err(SessionError::NotStarted);
        }
        self.enter(node_id, None)
    }

    /// Pop one history entry. Returns the node now shown, or `None` at the root.
    pub fn go_back(&mut self) -> Option<NodeId> {
        if self.history.len() <= 1 {
            return None;
        }
        self.history.pop();
        let previous = self.history.last().map(|entry| entry.node_id)?;
        info!(node_id = %previous, "Went back");
        self.current = Some(previous);
        Some(previous)
    }

    pub fn navigation_model(
        &self,
        overrides: NavigationOverrides,
    ) -> Result<NavigationModel, SessionError> {
        let current = self.current.ok_or(SessionError::NotStarted)?;
        let node = self.graph.node(current);
        let props = node.map(Node::merged_props).unwrap_or_default();
        let config = build_navigation_config(&props, overrides);
        let links = self.graph.navigation_links(current);
        let input = NavigationInput {
            current_node: node,
            current_node_id: Some(current),
            current_node_props: &props,
            links: &links,
            config: &config,
            nodes: &self.graph,
            visited: &self.visited,
        };
        Ok(build_navigation_model(&input))
    }

    /// Audio for the current node, if one is shown.
    pub fn audio_source(&self) -> Option<AudioSourceConfig> {
        self.current_node()
            .map(|node| build_audio_source_config(node, Some(&self.adventure)))
    }

    /// Image, video and reference link of the current node.
    pub fn node_media(&self) -> Option<NodeMedia> {
        self.current_node().map(|node| {
            resolve_node_media(node, resolve_node_kind(Some(node)), Some(&self.adventure))
        })
    }

    /// Audio candidates of every node one click away, for preloading.
    pub fn upcoming_audio_urls(&self) -> Vec<String> {
        let Some(current) = self.current else {
            return Vec::new();
        };
        let mut urls: Vec<String> = Vec::new();
        for link in self.graph.navigation_links(current) {
            let target = if link.is_reversed_at(current) {
                Some(link.from_node_id)
            } else {
                link.to_node_id
            };
            let Some(node) = target.and_then(|node_id| self.graph.node(node_id)) else {
                continue;
            };
            let source = build_audio_source_config(node, Some(&self.adventure));
            for url in source.main_candidates.into_iter().chain(source.alt_candidates) {
                if !urls.contains(&url) {
                    urls.push(url);
                }
            }
        }
        urls
    }

    fn enter(
        &mut self,
        node_id: NodeId,
        chosen_link_id: Option<LinkId>,
    ) -> Result<Transition, SessionError> {
        let mut target = node_id;
        let mut redirected_via = Vec::new();

        for _ in 0..=self.max_redirects {
            let decision = {
                let ctx = EngineContext::new(&self.graph, &self.visited);
                let random = &self.random;
                decide_on_enter_node(target, &ctx, |len| random.pick_index(len))
            };
            debug!(node_id = %target, ?decision, "Enter decision");

            match decision {
                EnterNodeDecision::Show { node_id, node_kind } => {
                    self.visited.insert(node_id);
                    self.current = Some(node_id);
                    self.history.push(HistoryEntry {
                        node_id,
                        chosen_link_id,
                    });
                    info!(node_id = %node_id, kind = ?node_kind, "Entered node");
                    return Ok(Transition {
                        node_id,
                        node_kind,
                        redirected_via,
                    });
                }
                EnterNodeDecision::Auto {
                    node_id,
                    via_link_id,
                    target_node_id,
                    ..
                } => {
                    self.visited.insert(node_id);
                    redirected_via.push(via_link_id);
                    target = target_node_id;
                }
                EnterNodeDecision::Error { error, .. } => return Err(error.into()),
            }
        }

        Err(SessionError::RedirectLoop(node_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::MockRandomPort;
    use storyweb_domain::Link;

    fn first_pick() -> Arc<dyn RandomPort> {
        let mut random = MockRandomPort::new();
        random.expect_pick_index().returning(|_| 0);
        Arc::new(random)
    }

    fn no_random() -> Arc<dyn RandomPort> {
        let mut random = MockRandomPort::new();
        random.expect_pick_index().never();
        Arc::new(random)
    }

    fn story() -> Adventure {
        Adventure::new("tale", "Tale")
            .with_node(Node::new(1, "Start").with_type("root"))
            .with_node(Node::new(2, "Hall"))
            .with_node(Node::new(3, "Garden"))
            .with_node(Node::new(4, "Fork").with_type("random"))
            .with_link(Link::between(10, 1, 2).with_label("Enter the hall"))
            .with_link(Link::between(11, 2, 3).with_type("bidirectional"))
            .with_link(Link::between(12, 1, 4))
            .with_link(Link::between(13, 4, 3))
            .with_link(Link::new(14, 1, None))
            .with_link(Link::between(15, 1, 99))
    }

    #[test]
    fn test_start_enters_root() {
        let mut session = PlayerSession::new(story(), no_random());
        let shown = session.start().unwrap();

        assert_eq!(shown.node_id, NodeId::new(1));
        assert_eq!(shown.node_kind, NodeKind::Root);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.visited_count(), 1);
        assert_eq!(session.progress_percent(), 25);
    }

    #[test]
    fn test_start_without_nodes_fails() {
        let mut session = PlayerSession::new(Adventure::default(), no_random());
        assert_eq!(session.start(), Err(SessionError::NoNodes));
        assert_eq!(session.progress_percent(), 0);
    }

    #[test]
    fn test_operations_before_start_fail() {
        let mut session = PlayerSession::new(story(), no_random());
        assert_eq!(
            session.choose_link(LinkId::new(10)),
            Err(SessionError::NotStarted)
        );
        assert_eq!(session.go_home(), Err(SessionError::NotStarted));
        assert!(session.navigation_model(NavigationOverrides::default()).is_err());
        assert!(session.audio_source().is_none());
    }

    #[test]
    fn test_choose_link_moves_and_records_history() {
        let mut session = PlayerSession::new(story(), no_random());
        session.start().unwrap();
        let shown = session.choose_link(LinkId::new(10)).unwrap();

        assert_eq!(shown.node_id, NodeId::new(2));
        assert_eq!(
            session.history().last(),
            Some(&HistoryEntry {
                node_id: NodeId::new(2),
                chosen_link_id: Some(LinkId::new(10)),
            })
        );
        assert!(session.visited().contains(&NodeId::new(2)));
    }

    #[test]
    fn test_broken_links_leave_session_in_place() {
        let mut session = PlayerSession::new(story(), no_random());
        session.start().unwrap();

        let missing = session.choose_link(LinkId::new(404)).unwrap_err();
        assert_eq!(missing.engine_error(), Some(&EngineError::missing_link()));

        let dangling = session.choose_link(LinkId::new(14)).unwrap_err();
        assert_eq!(
            dangling.engine_error(),
            Some(&EngineError::link_without_destination())
        );

        let gone = session.choose_link(LinkId::new(15)).unwrap_err();
        assert_eq!(gone.engine_error(), Some(&EngineError::missing_target_node()));

        assert_eq!(session.current_node_id(), Some(NodeId::new(1)));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_random_node_redirects_without_history_entry() {
        let mut session = PlayerSession::new(story(), first_pick());
        session.start().unwrap();
        let shown = session.choose_link(LinkId::new(12)).unwrap();

        assert_eq!(shown.node_id, NodeId::new(3));
        assert_eq!(shown.redirected_via, vec![LinkId::new(13)]);
        assert!(session.visited().contains(&NodeId::new(4)));
        let path: Vec<_> = session.history().iter().map(|e| e.node_id.get()).collect();
        assert_eq!(path, vec![1, 3]);
        assert_eq!(
            session.history().last().and_then(|e| e.chosen_link_id),
            Some(LinkId::new(12))
        );
    }

    #[test]
    fn test_random_cycle_is_cut_off() {
        let adventure = Adventure::new("loop", "Loop")
            .with_node(Node::new(1, "Start").with_type("root"))
            .with_node(Node::new(2, "A").with_type("random"))
            .with_node(Node::new(3, "B").with_type("random"))
            .with_link(Link::between(10, 1, 2))
            .with_link(Link::between(11, 2, 3))
            .with_link(Link::between(12, 3, 2));
        let mut session = PlayerSession::new(adventure, first_pick()).with_max_redirects(4);
        session.start().unwrap();

        assert_eq!(
            session.choose_link(LinkId::new(10)),
            Err(SessionError::RedirectLoop(NodeId::new(2)))
        );
        assert_eq!(session.current_node_id(), Some(NodeId::new(1)));
    }

    #[test]
    fn test_reversed_bidirectional_link_returns_to_source() {
        let mut session = PlayerSession::new(story(), first_pick());
        session.start().unwrap();
        session.choose_link(LinkId::new(12)).unwrap();

        let shown = session.choose_link(LinkId::new(11)).unwrap();
        assert_eq!(shown.node_id, NodeId::new(2));
    }

    #[test]
    fn test_go_back_and_home() {
        let mut session = PlayerSession::new(story(), no_random());
        session.start().unwrap();
        assert_eq!(session.go_back(), None);

        session.choose_link(LinkId::new(10)).unwrap();
        session.choose_link(LinkId::new(11)).unwrap();
        assert_eq!(session.go_back(), Some(NodeId::new(2)));
        assert_eq!(session.current_node_id(), Some(NodeId::new(2)));
        assert_eq!(session.visited_count(), 3);

        session.go_home().unwrap();
        assert_eq!(session.current_node_id(), Some(NodeId::new(1)));
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.visited_count(), 1);
    }

    #[test]
    fn test_go_to_node_goes_through_decisions() {
        let mut session = PlayerSession::new(story(), first_pick());
        session.start().unwrap();

        let shown = session.go_to_node(NodeId::new(4)).unwrap();
        assert_eq!(shown.node_id, NodeId::new(3));

        let missing = session.go_to_node(NodeId::new(99)).unwrap_err();
        assert_eq!(missing.engine_error(), Some(&EngineError::missing_node()));
    }

    #[test]
    fn test_navigation_model_for_current_node() {
        let mut session = PlayerSession::new(story(), no_random());
        session.start().unwrap();
        session.choose_link(LinkId::new(10)).unwrap();

        let model = session
            .navigation_model(NavigationOverrides::default())
            .unwrap();
        let labels: Vec<_> = model.buttons.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Garden"]);
        assert_eq!(model.primary_link_id, Some(LinkId::new(11)));
    }

    #[test]
    fn test_audio_source_and_upcoming_urls() {
        let mut adventure = story();
        adventure.nodes[1] = Node::new(2, "Hall").with_raw_prop("audio_url", "hall.mp3");
        let mut session = PlayerSession::new(adventure, no_random());
        session.start().unwrap();

        let source = session.audio_source().unwrap();
        assert!(source.is_silent());
        assert_eq!(
            session.upcoming_audio_urls(),
            vec![
                "/upload/tale/hall.mp3".to_string(),
                "/upload/hall.mp3".to_string(),
                "hall.mp3".to_string(),
            ]
        );
    }

    #[test]
    fn test_node_media_for_reference_node() {
        let mut adventure = story();
        adventure.nodes[1] = Node::new(2, "Hall")
            .with_type("ref-node")
            .with_text("See https://example.com/hall");
        let mut session = PlayerSession::new(adventure, no_random());
        assert_eq!(session.node_media(), None);

        session.start().unwrap();
        assert_eq!(session.node_media().and_then(|m| m.reference), None);

        session.choose_link(LinkId::new(10)).unwrap();
        let reference = session.node_media().and_then(|m| m.reference).unwrap();
        assert_eq!(reference.url.as_deref(), Some("https://example.com/hall"));
        assert!(!reference.new_tab);
    }
}

use crate::{Link, NodeId};

/// Where following `link` from `current` leads. Bidirectional links that
/// end at the current node are walked backwards.
pub fn resolve_navigation_target_id(link: &Link, current: Option<NodeId>) -> Option<NodeId> {
    match current {
        Some(node_id) if link.is_reversed_at(node_id) => Some(link.from_node_id),
        _ => link.to_node_id,
    }
}

/// Explicit label for a link; a reversed link uses its source title.
pub fn resolve_navigation_label(link: &Link, current: Option<NodeId>) -> Option<String> {
    let raw = match current {
        Some(node_id) if link.is_reversed_at(node_id) => link.source_title.as_deref(),
        _ => link.label.as_deref(),
    };
    raw.map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed_bidirectional_link() {
        let link = Link::between(1, 10, 20)
            .with_type("Bidirectional")
            .with_label("Forward")
            .with_source_title("  Back home ");
        let at_target = Some(NodeId::new(20));
        assert_eq!(resolve_navigation_target_id(&link, at_target), Some(NodeId::new(10)));
        assert_eq!(resolve_navigation_label(&link, at_target), Some("Back home".into()));

        let at_source = Some(NodeId::new(10));
        assert_eq!(resolve_navigation_target_id(&link, at_source), Some(NodeId::new(20)));
        assert_eq!(resolve_navigation_label(&link, at_source), Some("Forward".into()));
    }

    #[test]
    fn test_blank_label_is_none() {
        let link = Link::between(1, 10, 20).with_label("   ");
        assert_eq!(resolve_navigation_label(&link, None), None);
        assert_eq!(resolve_navigation_target_id(&link, None), Some(NodeId::new(20)));
    }
}

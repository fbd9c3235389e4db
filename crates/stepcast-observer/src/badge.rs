//! On-page capture indicator.

use crate::dom::{Document, NodeId};

pub const BADGE_ID: &str = "__recorder_debug_badge";
pub const BADGE_IDLE_TEXT: &str = "Recorder active";

const BADGE_STYLE: &str = "position: fixed; top: 12px; right: 12px; z-index: 999999; \
    background: #111827; color: #e5e7eb; padding: 8px 10px; border-radius: 8px; \
    font-size: 12px; font-family: Arial, sans-serif; box-shadow: 0 2px 8px rgba(0,0,0,0.3)";

/// Insert the badge under the document root unless it already exists.
pub fn ensure_badge(doc: &mut Document) -> NodeId {
    if let Some(existing) = doc.get_element_by_id(BADGE_ID) {
        return existing;
    }
    let root = doc.root();
    let badge = doc.append_element(root, "div");
    doc.set_attr(badge, "id", BADGE_ID);
    doc.set_attr(badge, "style", BADGE_STYLE);
    doc.set_text(badge, BADGE_IDLE_TEXT);
    badge
}

/// Set the badge text, reusing `known` while it is still the mounted badge.
/// Returns the badge node.
pub fn update_badge(doc: &mut Document, known: Option<NodeId>, text: &str) -> NodeId {
    let badge = known
        .filter(|id| is_mounted_badge(doc, *id))
        .unwrap_or_else(|| ensure_badge(doc));
    doc.set_text(badge, text);
    badge
}

fn is_mounted_badge(doc: &Document, id: NodeId) -> bool {
    doc.element(id).and_then(|el| el.attr("id")) == Some(BADGE_ID) && doc.is_attached(id)
}

pub fn badge_text(doc: &Document) -> Option<String> {
    doc.get_element_by_id(BADGE_ID).map(|b| doc.text_content(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_is_idempotent() {
        let mut doc = Document::new();
        let first = ensure_badge(&mut doc);
        let second = ensure_badge(&mut doc);
        assert_eq!(first, second);
        assert_eq!(badge_text(&doc).as_deref(), Some("Recorder active"));
    }

    #[test]
    fn test_update_recreates_missing_badge() {
        let mut doc = Document::new();
        assert_eq!(badge_text(&doc), None);

        update_badge(&mut doc, None, "Captured: click");
        assert_eq!(badge_text(&doc).as_deref(), Some("Captured: click"));
    }

    #[test]
    fn test_repeated_updates_keep_node_count() {
        let mut doc = Document::new();
        let badge = update_badge(&mut doc, None, "Captured: click");
        let nodes = doc.len();

        for kind in ["input", "select", "toggle", "click"] {
            assert_eq!(update_badge(&mut doc, Some(badge), &format!("Captured: {}", kind)), badge);
        }
        assert_eq!(doc.len(), nodes);
        assert_eq!(badge_text(&doc).as_deref(), Some("Captured: click"));
    }

    #[test]
    fn test_stale_badge_is_remounted() {
        let mut doc = Document::new();
        let badge = update_badge(&mut doc, None, "Captured: click");
        // Wiping the root's children unmounts the badge.
        doc.set_text(doc.root(), "replaced");

        let remounted = update_badge(&mut doc, Some(badge), "Captured: input");
        assert_ne!(remounted, badge);
        assert_eq!(badge_text(&doc).as_deref(), Some("Captured: input"));
    }
}

use deska_figma::{Node, NodeType};

/// Guard against pathological nesting; real guide frames sit well above this.
const MAX_DEPTH: usize = 20;

/// Collect the visible text content of a subtree in document order.
pub fn extract_text(node: &Node) -> Vec<String> {
    let mut texts = Vec::new();
    walk(node, 0, &mut texts);
    texts
}

/// As [`extract_text`], joined with blank lines; `None` when the subtree has
/// no text at all.
pub fn extract_text_joined(node: &Node) -> Option<String> {
    let texts = extract_text(node);
    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n\n"))
    }
}

fn walk(node: &Node, depth: usize, texts: &mut Vec<String>) {
    if depth > MAX_DEPTH {
        return;
    }
    if node.node_type == NodeType::Text {
        if let Some(chars) = &node.characters {
            let trimmed = chars.trim();
            if !trimmed.is_empty() {
                texts.push(trimmed.to_string());
            }
        }
    }
    for child in &node.children {
        walk(child, depth + 1, texts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_node(chars: &str) -> Node {
        Node {
            id: "1:1".into(),
            name: "label".into(),
            node_type: NodeType::Text,
            characters: Some(chars.into()),
            ..Default::default()
        }
    }

    fn frame(children: Vec<Node>) -> Node {
        Node {
            id: "0:1".into(),
            name: "frame".into(),
            node_type: NodeType::Frame,
            children,
            ..Default::default()
        }
    }

    #[test]
    fn collects_nested_text_in_document_order() {
        let tree = frame(vec![
            text_node("Usage"),
            frame(vec![text_node("Do"), text_node("Don't")]),
        ]);
        assert_eq!(extract_text(&tree), vec!["Usage", "Do", "Don't"]);
    }

    #[test]
    fn skips_blank_text_nodes() {
        let tree = frame(vec![text_node("   "), text_node("Rules")]);
        assert_eq!(extract_text_joined(&tree).as_deref(), Some("Rules"));
    }

    #[test]
    fn empty_subtree_yields_none() {
        assert!(extract_text_joined(&frame(vec![])).is_none());
    }

    #[test]
    fn recursion_stops_at_the_depth_bound() {
        let mut tree = text_node("too deep");
        for _ in 0..25 {
            tree = frame(vec![tree]);
        }
        assert!(extract_text(&tree).is_empty());
    }
}

use deska_figma::{Node, NodeType};
use std::collections::HashMap;

/// Children below this depth are not visited.
const MAX_TOKEN_DEPTH: usize = 5;
/// Raw visual fallbacks are noisy; only surface them near the root.
const MAX_RAW_DEPTH: usize = 3;

/// Resolve a subtree's design-token bindings to human-readable lines.
///
/// Bound variables and style references resolve through the pre-fetched
/// id -> name maps. When a node carries neither, raw visual facts (fill,
/// radius, stroke, font) are emitted with distinct tags so hard-coded values
/// stand apart from named tokens; that contrast is how un-tokenized design
/// debt gets flagged. Output is deduplicated and sorted for determinism.
pub fn resolve_tokens(
    node: &Node,
    var_map: &HashMap<String, String>,
    style_map: &HashMap<String, String>,
) -> Vec<String> {
    let mut lines = Vec::new();
    visit(node, 0, &[], var_map, style_map, &mut lines);
    lines.sort();
    lines.dedup();
    lines
}

fn visit<'a>(
    node: &'a Node,
    depth: usize,
    ancestors: &[&'a str],
    var_map: &HashMap<String, String>,
    style_map: &HashMap<String, String>,
    lines: &mut Vec<String>,
) {
    if !node.visible {
        return;
    }

    let path = if ancestors.is_empty() {
        node.name.clone()
    } else {
        format!("{} > {}", ancestors.join(" > "), node.name)
    };

    let mut found_binding = false;

    // Bound variables: scalar alias or per-index alias list (e.g. fills).
    if let Some(bound) = node.bound_variables.as_ref().and_then(|v| v.as_object()) {
        for (prop, value) in bound {
            if let Some(id) = value.get("id").and_then(|id| id.as_str()) {
                if let Some(var_name) = var_map.get(id) {
                    lines.push(format!("{path} ({prop}): [token] {var_name}"));
                    found_binding = true;
                }
            } else if let Some(aliases) = value.as_array() {
                for (i, alias) in aliases.iter().enumerate() {
                    if let Some(id) = alias.get("id").and_then(|id| id.as_str()) {
                        if let Some(var_name) = var_map.get(id) {
                            lines.push(format!("{path} ({prop}[{i}]): [token] {var_name}"));
                            found_binding = true;
                        }
                    }
                }
            }
        }
    }

    // Style references, resolved through the dual-keyed style map.
    if let Some(styles) = &node.styles {
        for (prop, style_id) in styles {
            if let Some(style_name) = style_map.get(style_id) {
                lines.push(format!("{path} ({prop}): [style] {style_name}"));
                found_binding = true;
            }
        }
    }

    if !found_binding && depth < MAX_RAW_DEPTH {
        extract_raw(node, &path, lines);
    }

    if depth < MAX_TOKEN_DEPTH {
        let mut next = ancestors.to_vec();
        next.push(&node.name);
        for child in &node.children {
            if child.visible {
                visit(child, depth + 1, &next, var_map, style_map, lines);
            }
        }
    }
}

/// Raw visual facts for nodes with no named binding.
fn extract_raw(node: &Node, path: &str, lines: &mut Vec<String>) {
    if let Some(fill) = node.fills.iter().find(|p| p.is_visible_solid()) {
        if let Some(color) = fill.color {
            let opacity = fill.opacity.unwrap_or(1.0);
            if opacity < 1.0 {
                lines.push(format!(
                    "{path} (fill): [raw-fill] {}/{:.0}%",
                    color.to_hex(),
                    opacity * 100.0
                ));
            } else {
                lines.push(format!("{path} (fill): [raw-fill] {}", color.to_hex()));
            }
        }
    }

    if let Some(radius) = node.corner_radius {
        if radius > 0.0 {
            lines.push(format!("{path} (radius): [raw-radius] {radius}px"));
        }
    }

    if let Some(stroke) = node.strokes.iter().find(|p| p.is_visible_solid()) {
        if let Some(color) = stroke.color {
            let weight = node.stroke_weight.unwrap_or(1.0);
            lines.push(format!(
                "{path} (stroke): [raw-stroke] {} {weight}px",
                color.to_hex()
            ));
        }
    }

    if node.node_type == NodeType::Text {
        if let Some(style) = &node.style {
            if let (Some(family), Some(size)) = (&style.font_family, style.font_size) {
                lines.push(format!("{path} (font): [raw-font] {family} {size}px"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deska_figma::{Color, Paint, TypeStyle};
    use serde_json::json;

    fn maps() -> (HashMap<String, String>, HashMap<String, String>) {
        let vars = HashMap::from([("VariableID:1:1".to_string(), "color/bg/primary".to_string())]);
        let styles = HashMap::from([("S:abc".to_string(), "Text/Body M".to_string())]);
        (vars, styles)
    }

    fn solid(hex_r: f64) -> Paint {
        Paint {
            paint_type: "SOLID".into(),
            visible: true,
            color: Some(Color { r: hex_r, g: 0.0, b: 0.0, a: 1.0 }),
            opacity: None,
        }
    }

    #[test]
    fn bound_variable_resolves_to_name() {
        let (vars, styles) = maps();
        let node = Node {
            name: "Button".into(),
            bound_variables: Some(json!({"fills": [{"id": "VariableID:1:1"}]})),
            ..Default::default()
        };
        let lines = resolve_tokens(&node, &vars, &styles);
        assert_eq!(lines, vec!["Button (fills[0]): [token] color/bg/primary"]);
    }

    #[test]
    fn style_reference_resolves_through_dual_key_map() {
        let (vars, styles) = maps();
        let node = Node {
            name: "Label".into(),
            styles: Some(HashMap::from([("text".to_string(), "S:abc".to_string())])),
            ..Default::default()
        };
        let lines = resolve_tokens(&node, &vars, &styles);
        assert_eq!(lines, vec!["Label (text): [style] Text/Body M"]);
    }

    #[test]
    fn raw_fallback_only_without_bindings() {
        let (vars, styles) = maps();
        let node = Node {
            name: "Chip".into(),
            fills: vec![solid(1.0)],
            corner_radius: Some(8.0),
            bound_variables: Some(json!({"fills": [{"id": "VariableID:1:1"}]})),
            ..Default::default()
        };
        let lines = resolve_tokens(&node, &vars, &styles);
        // The named token claims the node; no raw fill/radius lines.
        assert_eq!(lines, vec!["Chip (fills[0]): [token] color/bg/primary"]);
    }

    #[test]
    fn raw_fill_includes_opacity_suffix() {
        let node = Node {
            name: "Overlay".into(),
            fills: vec![Paint {
                opacity: Some(0.4),
                ..solid(0.0)
            }],
            ..Default::default()
        };
        let lines = resolve_tokens(&node, &HashMap::new(), &HashMap::new());
        assert_eq!(lines, vec!["Overlay (fill): [raw-fill] #000000/40%"]);
    }

    #[test]
    fn font_fallback_for_text_nodes() {
        let node = Node {
            name: "Title".into(),
            node_type: NodeType::Text,
            style: Some(TypeStyle {
                font_family: Some("Inter".into()),
                font_size: Some(16.0),
            }),
            ..Default::default()
        };
        let lines = resolve_tokens(&node, &HashMap::new(), &HashMap::new());
        assert_eq!(lines, vec!["Title (font): [raw-font] Inter 16px"]);
    }

    #[test]
    fn invisible_subtrees_are_skipped() {
        let node = Node {
            name: "Root".into(),
            children: vec![Node {
                name: "Hidden".into(),
                visible: false,
                fills: vec![solid(1.0)],
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(resolve_tokens(&node, &HashMap::new(), &HashMap::new()).is_empty());
    }

    #[test]
    fn depth_bounds_hold_on_a_deep_tree() {
        let (vars, styles) = maps();
        // 10-level chain; every level carries a bound variable and a fill.
        let mut node = Node::default();
        for depth in (0..10).rev() {
            node = Node {
                name: format!("L{depth}"),
                bound_variables: Some(json!({"opacity": {"id": "VariableID:1:1"}})),
                fills: vec![solid(1.0)],
                children: if node.name.is_empty() { vec![] } else { vec![node] },
                ..Default::default()
            };
        }
        let lines = resolve_tokens(&node, &vars, &styles);
        // Levels 0..=5 visited, deeper never.
        assert!(lines.iter().any(|l| l.contains("L5 (opacity)")));
        assert!(!lines.iter().any(|l| l.contains("L6")));
        assert_eq!(lines.iter().filter(|l| l.contains("[token]")).count(), 6);
    }

    #[test]
    fn raw_entries_never_emitted_at_depth_three_or_below() {
        // Bindings absent everywhere, fills present everywhere.
        let mut node = Node::default();
        for depth in (0..10).rev() {
            node = Node {
                name: format!("L{depth}"),
                fills: vec![solid(1.0)],
                children: if node.name.is_empty() { vec![] } else { vec![node] },
                ..Default::default()
            };
        }
        let lines = resolve_tokens(&node, &HashMap::new(), &HashMap::new());
        assert_eq!(lines.iter().filter(|l| l.contains("[raw-fill]")).count(), 3);
        assert!(!lines.iter().any(|l| l.contains("L3 (fill)")));
    }
}

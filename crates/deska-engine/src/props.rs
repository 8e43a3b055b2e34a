use deska_figma::{Node, PropertyKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Machine-readable property description for downstream code generation.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyInfo {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "variantOptions", skip_serializing_if = "Vec::is_empty")]
    pub variant_options: Vec<String>,
}

/// Extract component property definitions from a component-set node.
///
/// Non-variant property names carry a `#id` suffix in the API
/// ("Label#123:0"); that suffix is an internal id, not part of the name.
pub fn property_definitions(node: &Node) -> BTreeMap<String, PropertyInfo> {
    let Some(defs) = &node.component_property_definitions else {
        return BTreeMap::new();
    };
    defs.iter()
        .map(|(raw_name, def)| {
            let name = raw_name.split('#').next().unwrap_or(raw_name).to_string();
            (
                name,
                PropertyInfo {
                    kind: kind_label(def.kind).to_string(),
                    variant_options: def.variant_options.clone(),
                },
            )
        })
        .collect()
}

fn kind_label(kind: PropertyKind) -> &'static str {
    match kind {
        PropertyKind::Variant => "VARIANT",
        PropertyKind::Boolean => "BOOLEAN",
        PropertyKind::Text => "TEXT",
        PropertyKind::InstanceSwap => "INSTANCE_SWAP",
        PropertyKind::Other => "OTHER",
    }
}

/// One human line per property, for prose answers.
pub fn summarize_properties(defs: &BTreeMap<String, PropertyInfo>) -> String {
    defs.iter()
        .map(|(name, info)| match info.kind.as_str() {
            "VARIANT" => format!("{name}: {}", info.variant_options.join(", ")),
            "BOOLEAN" => format!("{name}: True/False"),
            "TEXT" => format!("{name}: Text"),
            "INSTANCE_SWAP" => format!("{name}: Instance"),
            _ => name.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

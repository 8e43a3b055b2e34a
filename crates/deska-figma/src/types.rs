use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

fn default_visible() -> bool {
    true
}

/// Node types we branch on; everything else is carried opaquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Document,
    Canvas,
    Frame,
    Section,
    Component,
    ComponentSet,
    Instance,
    Text,
    #[serde(other)]
    #[default]
    Other,
}

/// One node of a file's document tree.
///
/// The tree is fetched fresh per query and discarded afterwards. Attributes
/// whose upstream schema is open-ended (bound variables) stay as raw JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Text content, only present on TEXT nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    /// property -> variable alias or list of aliases, shape varies by property.
    #[serde(rename = "boundVariables", default, skip_serializing_if = "Option::is_none")]
    pub bound_variables: Option<serde_json::Value>,
    /// property -> style id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<HashMap<String, String>>,
    #[serde(default)]
    pub fills: Vec<Paint>,
    #[serde(default)]
    pub strokes: Vec<Paint>,
    #[serde(rename = "strokeWeight", default, skip_serializing_if = "Option::is_none")]
    pub stroke_weight: Option<f64>,
    #[serde(rename = "cornerRadius", default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
    /// Type style of TEXT nodes (font family, size).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TypeStyle>,
    /// Master component reference, only present on INSTANCE nodes.
    #[serde(rename = "componentId", default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    #[serde(
        rename = "componentPropertyDefinitions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub component_property_definitions: Option<BTreeMap<String, PropertyDefinition>>,
    #[serde(rename = "absoluteBoundingBox", default, skip_serializing_if = "Option::is_none")]
    pub absolute_bounding_box: Option<BoundingBox>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            node_type: NodeType::default(),
            children: Vec::new(),
            // Matches the deserialization default; nodes are visible unless
            // the payload says otherwise.
            visible: true,
            characters: None,
            bound_variables: None,
            styles: None,
            fills: Vec::new(),
            strokes: Vec::new(),
            stroke_weight: None,
            corner_radius: None,
            style: None,
            component_id: None,
            component_property_definitions: None,
            absolute_bounding_box: None,
        }
    }
}

impl Node {
    pub fn is_container(&self) -> bool {
        matches!(
            self.node_type,
            NodeType::Frame | NodeType::Section | NodeType::Component | NodeType::ComponentSet
        )
    }

    /// Horizontal position, used to order pattern frames in reading order.
    pub fn x(&self) -> f64 {
        self.absolute_bounding_box.as_ref().map_or(0.0, |b| b.x)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct BoundingBox {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paint {
    #[serde(rename = "type", default)]
    pub paint_type: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            paint_type: String::new(),
            visible: true,
            color: None,
            opacity: None,
        }
    }
}

impl Paint {
    pub fn is_visible_solid(&self) -> bool {
        self.visible && self.paint_type == "SOLID" && self.color.is_some()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct Color {
    #[serde(default)]
    pub r: f64,
    #[serde(default)]
    pub g: f64,
    #[serde(default)]
    pub b: f64,
    #[serde(default)]
    pub a: f64,
}

impl Color {
    pub fn to_hex(self) -> String {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02X}{:02X}{:02X}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TypeStyle {
    #[serde(rename = "fontFamily", default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(rename = "fontSize", default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

/// One component property definition from a component set.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PropertyDefinition {
    #[serde(rename = "type", default)]
    pub kind: PropertyKind,
    #[serde(rename = "variantOptions", default)]
    pub variant_options: Vec<String>,
    #[serde(rename = "defaultValue", default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyKind {
    Variant,
    Boolean,
    Text,
    InstanceSwap,
    #[serde(other)]
    #[default]
    Other,
}

/// One row of the bulk component listing (`GET /files/{key}/components`).
///
/// The containing frame groups all size/state/type variants of one logical
/// component; it is the semantically meaningful unit for search.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ComponentSummary {
    #[serde(default)]
    pub key: String,
    pub node_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containing_frame: Option<ContainingFrame>,
}

impl ComponentSummary {
    pub fn frame_name(&self) -> &str {
        self.containing_frame.as_ref().map_or("", |f| f.name.as_str())
    }

    pub fn page_id(&self) -> Option<&str> {
        self.containing_frame.as_ref().and_then(|f| f.page_id.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContainingFrame {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "nodeId", default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(rename = "pageId", default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(rename = "pageName", default, skip_serializing_if = "Option::is_none")]
    pub page_name: Option<String>,
}

// Response envelopes.

#[derive(Debug, Clone, Deserialize)]
pub struct FileResponse {
    pub document: Node,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NodesResponse {
    #[serde(default)]
    pub nodes: HashMap<String, NodeEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NodeEntry {
    pub document: Node,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImagesResponse {
    #[serde(default)]
    pub images: HashMap<String, Option<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ComponentsResponse {
    #[serde(default)]
    pub meta: ComponentsMeta,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ComponentsMeta {
    #[serde(default)]
    pub components: Vec<ComponentSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StylesResponse {
    #[serde(default)]
    pub meta: StylesMeta,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StylesMeta {
    #[serde(default)]
    pub styles: Vec<StyleSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StyleSummary {
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariablesResponse {
    #[serde(default)]
    pub meta: VariablesMeta,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VariablesMeta {
    #[serde(default)]
    pub variables: Vec<VariableSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariableSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_falls_back_to_other() {
        let node: Node =
            serde_json::from_str(r#"{"id":"1:2","name":"Vector","type":"BOOLEAN_OPERATION"}"#)
                .unwrap();
        assert_eq!(node.node_type, NodeType::Other);
        assert!(node.visible);
    }

    #[test]
    fn component_set_type_parses() {
        let node: Node =
            serde_json::from_str(r#"{"id":"1:2","name":"Button","type":"COMPONENT_SET"}"#).unwrap();
        assert_eq!(node.node_type, NodeType::ComponentSet);
    }

    #[test]
    fn color_to_hex_rounds_channels() {
        let c = Color { r: 1.0, g: 0.5, b: 0.0, a: 1.0 };
        assert_eq!(c.to_hex(), "#FF8000");
    }

    #[test]
    fn visibility_flag_defaults_true_and_parses_false() {
        let node: Node =
            serde_json::from_str(r#"{"id":"1:2","name":"Hidden","type":"FRAME","visible":false}"#)
                .unwrap();
        assert!(!node.visible);
    }
}

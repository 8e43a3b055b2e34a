pub mod client;
pub mod types;

pub use client::{deep_link, FigmaApi, FigmaClient, FigmaConfig, FIGMA_API_BASE};
pub use types::{
    BoundingBox, Color, ComponentSummary, ContainingFrame, FileResponse, Node, NodeType, Paint,
    PropertyDefinition, PropertyKind, TypeStyle,
};

use crate::details::{component_details, ComponentDetails};
use crate::usage::{find_component_usages, UsageReport};
use deska_common::{DeskaError, Result};
use deska_figma::{FigmaApi, NodeType};
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedFigmaUrl {
    pub file_key: String,
    pub node_id: Option<String>,
}

fn file_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/(?:file|design)/([A-Za-z0-9]{22,})").expect("valid regex"))
}

fn node_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"node-id=([^&]+)").expect("valid regex"))
}

fn bare_dashed_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+-\d+$").expect("valid regex"))
}

/// Extract file key and node id from a share URL.
///
/// File keys are 22+ alphanumeric chars after `/file/` or `/design/`. The
/// `node-id` value is percent-decoded; newer URL generations write "123-456"
/// where the API wants "123:456", so the bare-digit dashed form is
/// normalized and anything else passes through unchanged.
pub fn parse_figma_url(url: &str) -> Result<ParsedFigmaUrl> {
    let file_key = file_key_re()
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| DeskaError::NotFound("No file key found in the URL".into()))?;

    let node_id = node_id_re()
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| {
            let decoded = percent_decode_str(m.as_str()).decode_utf8_lossy().to_string();
            normalize_node_id(&decoded)
        });

    Ok(ParsedFigmaUrl { file_key, node_id })
}

pub fn normalize_node_id(raw: &str) -> String {
    if bare_dashed_id_re().is_match(raw) {
        raw.replace('-', ":")
    } else {
        raw.to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct UrlAnalysis {
    /// "instance_link" or "component_link".
    pub analysis_type: &'static str,
    pub target_name: String,
    pub target_id: String,
    pub file_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usages: Option<UsageReport>,
    pub details: ComponentDetails,
}

/// Identify what a share URL points at and resolve its component details.
///
/// An INSTANCE is followed to its master component so the canonical name
/// drives the lookup. Usage scanning is expensive and runs only when
/// `include_usages` is set.
pub async fn analyze_url(
    api: &dyn FigmaApi,
    url: &str,
    include_usages: bool,
) -> Result<UrlAnalysis> {
    let parsed = parse_figma_url(url)?;
    let node_id = parsed
        .node_id
        .ok_or_else(|| DeskaError::NotFound("The URL has no node-id parameter".into()))?;

    let node = api
        .get_node(&parsed.file_key, &node_id)
        .await?
        .ok_or_else(|| DeskaError::NotFound("Could not load the node behind the URL".into()))?;

    let mut target_id = node_id;
    let mut target_name = node.name.clone();
    let analysis_type = if node.node_type == NodeType::Instance {
        if let Some(master_id) = &node.component_id {
            target_id = master_id.clone();
            // The instance name usually matches the master, but the master
            // is authoritative when it resolves.
            if let Ok(Some(master)) = api.get_node(&parsed.file_key, master_id).await {
                target_name = master.name;
            }
        }
        "instance_link"
    } else {
        "component_link"
    };
    debug!(%target_name, %target_id, analysis_type, "analyzed url");

    let usages = if include_usages {
        Some(find_component_usages(api, &parsed.file_key, &target_id).await?)
    } else {
        None
    };

    let details = component_details(api, &parsed.file_key, &target_name).await?;

    Ok(UrlAnalysis {
        analysis_type,
        target_name,
        target_id,
        file_key: parsed.file_key,
        usages,
        details,
    })
}

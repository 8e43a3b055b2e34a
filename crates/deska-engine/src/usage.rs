use deska_common::Result;
use deska_figma::{FigmaApi, Node, NodeType};
use serde::Serialize;
use std::collections::BTreeMap;

const MAX_SAMPLES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct UsageSample {
    pub name: String,
    pub id: String,
    pub context: String,
}

/// Where a component is instantiated across one file.
#[derive(Debug, Serialize)]
pub struct UsageReport {
    pub total_count: usize,
    /// Containing frame/section/page name -> instance count.
    pub contexts: BTreeMap<String, usize>,
    pub usage_samples: Vec<UsageSample>,
}

/// Count instances of a master component in a whole document tree.
///
/// Context is the nearest FRAME/SECTION/CANVAS ancestor, which in practice
/// is the screen the instance sits on.
pub fn scan_usages(document: &Node, component_id: &str) -> UsageReport {
    let mut samples = Vec::new();
    let mut contexts = BTreeMap::new();
    let mut total = 0usize;
    walk(document, component_id, "Root", &mut total, &mut contexts, &mut samples);
    samples.truncate(MAX_SAMPLES);
    UsageReport {
        total_count: total,
        contexts,
        usage_samples: samples,
    }
}

fn walk(
    node: &Node,
    component_id: &str,
    context: &str,
    total: &mut usize,
    contexts: &mut BTreeMap<String, usize>,
    samples: &mut Vec<UsageSample>,
) {
    if node.node_type == NodeType::Instance
        && node.component_id.as_deref() == Some(component_id)
    {
        *total += 1;
        *contexts.entry(context.to_string()).or_default() += 1;
        samples.push(UsageSample {
            name: node.name.clone(),
            id: node.id.clone(),
            context: context.to_string(),
        });
    }

    let next_context = match node.node_type {
        NodeType::Frame | NodeType::Section | NodeType::Canvas => node.name.as_str(),
        _ => context,
    };
    for child in &node.children {
        walk(child, component_id, next_context, total, contexts, samples);
    }
}

/// Whole-file scan. Heavy (full-depth fetch) and therefore only run when a
/// caller asks for usages explicitly.
pub async fn find_component_usages(
    api: &dyn FigmaApi,
    file_key: &str,
    component_id: &str,
) -> Result<UsageReport> {
    let file = api.get_file(file_key, None).await?;
    Ok(scan_usages(&file.document, component_id))
}

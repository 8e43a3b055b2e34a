use crate::search::clean;
use crate::variants::resolve_variants;
use deska_common::{DeskaError, Result};
use deska_figma::{deep_link, FigmaApi};
use serde::Serialize;
use tracing::debug;

/// A rendered preview of one specific variant.
#[derive(Debug, Serialize)]
pub struct VariantImage {
    pub variant_name: String,
    pub node_id: String,
    pub image_url: Option<String>,
    pub figma_link: String,
    pub matched_terms: usize,
}

/// Pick the variant whose name best covers the free-text description
/// ("primary small disabled") and render it.
///
/// Scoring is term coverage over the cleaned variant name; ties go to the
/// first variant in source order.
pub async fn variant_image(
    api: &dyn FigmaApi,
    file_key: &str,
    component_name: &str,
    description: &str,
) -> Result<VariantImage> {
    let components = api.get_file_components(file_key).await?;
    let set = resolve_variants(&components, component_name);
    if set.members.is_empty() {
        return Err(DeskaError::NotFound(format!(
            "No variants found for '{component_name}'"
        )));
    }

    let terms: Vec<String> = description
        .split_whitespace()
        .map(clean)
        .filter(|t| !t.is_empty())
        .collect();

    let mut best = &set.members[0];
    let mut best_score = score(&best.name, &terms);
    for candidate in &set.members[1..] {
        let candidate_score = score(&candidate.name, &terms);
        if candidate_score > best_score {
            best = candidate;
            best_score = candidate_score;
        }
    }
    debug!(variant = %best.name, score = best_score, "selected variant for render");

    let image_url = api.get_image(file_key, &best.node_id).await?;
    Ok(VariantImage {
        variant_name: best.name.clone(),
        node_id: best.node_id.clone(),
        image_url,
        figma_link: deep_link(file_key, &best.node_id),
        matched_terms: best_score,
    })
}

fn score(variant_name: &str, terms: &[String]) -> usize {
    let name = clean(variant_name);
    terms.iter().filter(|t| name.contains(t.as_str())).count()
}

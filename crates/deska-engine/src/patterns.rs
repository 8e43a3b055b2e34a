use crate::search::{clean, normalize};
use crate::text::extract_text_joined;
use deska_common::{DeskaError, Result};
use deska_figma::{deep_link, FigmaApi, Node, NodeType};
use serde::Serialize;
use tracing::warn;

/// When no explicit guide frame exists, aggregate text from at most this
/// many top-level frames.
const MAX_AGGREGATED_FRAMES: usize = 10;

/// A resolved UX-pattern page: guide text, example frames, preview, and
/// neighbouring topics for "see also" follow-ups.
#[derive(Debug, Serialize)]
pub struct PatternInfo {
    pub name: String,
    pub guide: Option<String>,
    pub examples: Vec<String>,
    pub image_url: Option<String>,
    pub figma_link: String,
    pub related_patterns: Vec<String>,
}

/// Rank pattern pages against a query: exact, starts-with, contains.
/// Patterns are one topic per page, so page names are the search corpus.
pub fn rank_pages<'a>(query: &str, pages: &[&'a Node]) -> Vec<&'a Node> {
    let query_norm = normalize(query);
    if query_norm.is_empty() {
        return Vec::new();
    }
    let mut claimed = vec![false; pages.len()];
    let mut out = Vec::new();
    for pred in [
        &(|name: &str| name == query_norm) as &dyn Fn(&str) -> bool,
        &|name: &str| name.starts_with(&query_norm),
        &|name: &str| name.contains(&query_norm),
    ] {
        for (i, page) in pages.iter().enumerate() {
            if !claimed[i] && pred(&normalize(&page.name)) {
                claimed[i] = true;
                out.push(*page);
            }
        }
    }
    out
}

/// Page names matching a query, for universal search.
pub async fn search_patterns(
    api: &dyn FigmaApi,
    patterns_key: &str,
    query: &str,
) -> Result<Vec<String>> {
    let file = api.get_file(patterns_key, Some(1)).await?;
    let pages: Vec<&Node> = file.document.children.iter().collect();
    Ok(rank_pages(query, &pages)
        .into_iter()
        .map(|p| p.name.clone())
        .collect())
}

/// Resolve a pattern topic to its written rules and a preview.
pub async fn pattern_info(
    api: &dyn FigmaApi,
    patterns_key: &str,
    name: &str,
) -> Result<PatternInfo> {
    // Depth 2 gives every page plus its top-level frames in one fetch.
    let file = api.get_file(patterns_key, Some(2)).await?;
    let pages: Vec<&Node> = file.document.children.iter().collect();
    let ranked = rank_pages(name, &pages);
    let Some(page) = ranked.first().copied() else {
        return Err(DeskaError::NotFound(format!(
            "No pattern page found for '{name}'"
        )));
    };
    let related_patterns: Vec<String> =
        ranked.iter().skip(1).take(4).map(|p| p.name.clone()).collect();

    // Classify top-level frames: an explicit guide frame versus examples.
    let page_clean = clean(&page.name);
    let frames: Vec<&Node> = page
        .children
        .iter()
        .filter(|n| n.visible && matches!(n.node_type, NodeType::Frame | NodeType::Section))
        .collect();
    let guide_frame = frames.iter().copied().find(|f| {
        f.name.to_lowercase().contains("guide") || clean(&f.name) == page_clean
    });
    let guide_id = guide_frame.map(|f| f.id.as_str());
    let examples: Vec<String> = frames
        .iter()
        .filter(|f| Some(f.id.as_str()) != guide_id)
        .map(|f| f.name.clone())
        .collect();

    let (guide, image_node_id) = match guide_frame {
        Some(frame) => {
            let guide = fetch_frame_text(api, patterns_key, &frame.id).await;
            (guide, Some(frame.id.clone()))
        }
        None => aggregate_frames(api, patterns_key, &frames).await,
    };

    let image_url = match &image_node_id {
        Some(id) => api.get_image(patterns_key, id).await.unwrap_or_else(|e| {
            warn!(error = %e, "pattern image render errored");
            None
        }),
        None => None,
    };

    Ok(PatternInfo {
        name: page.name.clone(),
        guide,
        examples,
        image_url,
        figma_link: deep_link(patterns_key, &page.id),
        related_patterns,
    })
}

async fn fetch_frame_text(api: &dyn FigmaApi, file_key: &str, node_id: &str) -> Option<String> {
    match api.get_node(file_key, node_id).await {
        Ok(Some(node)) => extract_text_joined(&node),
        Ok(None) => None,
        Err(e) => {
            warn!(%node_id, error = %e, "frame fetch failed");
            None
        }
    }
}

/// No canonical guide frame exists: approximate reading order by sorting
/// frames left-to-right and concatenate their text under per-frame headers.
async fn aggregate_frames(
    api: &dyn FigmaApi,
    file_key: &str,
    frames: &[&Node],
) -> (Option<String>, Option<String>) {
    let mut ordered: Vec<&Node> = frames.to_vec();
    ordered.sort_by(|a, b| a.x().total_cmp(&b.x()));
    ordered.truncate(MAX_AGGREGATED_FRAMES);
    if ordered.is_empty() {
        return (None, None);
    }

    let ids: Vec<String> = ordered.iter().map(|f| f.id.clone()).collect();
    let fetched = match api.get_nodes(file_key, &ids).await {
        Ok(nodes) => nodes,
        Err(e) => {
            warn!(error = %e, "frame batch fetch failed");
            return (None, Some(ordered[0].id.clone()));
        }
    };

    let mut sections = Vec::new();
    for frame in &ordered {
        if let Some(node) = fetched.get(&frame.id) {
            if let Some(text) = extract_text_joined(node) {
                sections.push(format!("### {}\n{text}", frame.name));
            }
        }
    }
    let guide = if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    };
    // Leftmost frame stands in as the preview.
    (guide, Some(ordered[0].id.clone()))
}

use crate::props::{property_definitions, summarize_properties, PropertyInfo};
use crate::search::{clean, fuzzy_eq, normalize, rank_components};
use crate::text::extract_text_joined;
use crate::tokens::resolve_tokens;
use crate::variants::{resolve_variants, VariantStrategy};
use deska_common::{DeskaError, Result};
use deska_figma::{deep_link, FigmaApi, Node, NodeType};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Cover frames are searched this many levels below the page root.
const COVER_SEARCH_DEPTH: usize = 3;

/// Everything the assistant needs to answer "tell me about X".
///
/// Missing sub-results (guide, image, tokens) are `None`/empty, never
/// errors; the debug block records which resolution path produced what.
#[derive(Debug, Serialize)]
pub struct ComponentDetails {
    pub found_name: String,
    pub search_matches: Vec<String>,
    pub variants: Vec<String>,
    pub variants_count: usize,
    pub guide: Option<String>,
    pub image_url: Option<String>,
    pub figma_link: String,
    pub props: ComponentProps,
    #[serde(rename = "_debug_info")]
    pub debug: DetailsDebug,
}

#[derive(Debug, Default, Serialize)]
pub struct ComponentProps {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, PropertyInfo>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct DetailsDebug {
    pub target_id: String,
    pub page_id: Option<String>,
    pub image_found_via: Option<ImageSource>,
    pub guide_found_via: Option<GuideSource>,
    pub variant_strategy: VariantStrategy,
}

/// Which image strategy succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Cover,
    Node,
}

/// Which guide lookup succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuideSource {
    TargetName,
    RawQuery,
}

/// Resolve a loose component query into full details.
pub async fn component_details(
    api: &dyn FigmaApi,
    file_key: &str,
    query: &str,
) -> Result<ComponentDetails> {
    // The component listing is the one fetch that must succeed.
    let components = api.get_file_components(file_key).await?;
    let ranked = rank_components(query, &components);
    let Some(first) = ranked.first() else {
        return Err(DeskaError::NotFound(format!(
            "No components found for '{query}'"
        )));
    };

    // Default target is the best hit's own name; a hit whose containing
    // frame fuzzily matches the query overrides it, because the frame is
    // the canonical component concept.
    let mut target_name = first.component.name.clone();
    let mut target_id = first.component.node_id.clone();
    let mut page_id = first.component.page_id().map(str::to_string);
    for hit in &ranked {
        let frame = hit.component.frame_name();
        if !frame.is_empty() && fuzzy_eq(query, frame) {
            target_name = frame.to_string();
            target_id = hit.component.node_id.clone();
            page_id = hit.component.page_id().map(str::to_string);
            break;
        }
    }
    debug!(%target_name, %target_id, "resolved details target");

    let variant_set = resolve_variants(&components, &target_name);

    // Guide lookup, retried with the raw query when the resolved name finds
    // nothing and the two differ.
    let mut guide_found_via = None;
    let mut guide = fetch_guide(api, file_key, &target_name).await;
    if guide.is_some() {
        guide_found_via = Some(GuideSource::TargetName);
    } else if normalize(&target_name) != normalize(query) {
        guide = fetch_guide(api, file_key, query).await;
        if guide.is_some() {
            guide_found_via = Some(GuideSource::RawQuery);
        }
    }

    // Token bindings and property definitions from the target node itself.
    let mut props = ComponentProps::default();
    match api.get_node(file_key, &target_id).await {
        Ok(Some(node)) => {
            let (var_map, style_map) = tokio::join!(
                api.get_file_variables(file_key),
                api.get_file_styles(file_key)
            );
            let var_map = var_map.unwrap_or_default();
            let style_map = style_map.unwrap_or_default();
            props.tokens = resolve_tokens(&node, &var_map, &style_map);

            let definitions = property_definitions(&node);
            if !definitions.is_empty() {
                props.summary = summarize_properties(&definitions);
                props.definitions = definitions;
            }
        }
        Ok(None) => warn!(%target_id, "target node not found, skipping props"),
        Err(e) => warn!(%target_id, error = %e, "node fetch failed, skipping props"),
    }

    let (image_url, image_found_via) =
        resolve_image(api, file_key, &target_id, &target_name, page_id.as_deref()).await;

    Ok(ComponentDetails {
        found_name: target_name,
        search_matches: ranked
            .iter()
            .take(5)
            .map(|r| format!("{} (Frame: {})", r.component.name, r.component.frame_name()))
            .collect(),
        variants: variant_set
            .members
            .iter()
            .take(20)
            .map(|v| v.name.clone())
            .collect(),
        variants_count: variant_set.members.len(),
        guide,
        image_url,
        figma_link: deep_link(file_key, &target_id),
        props,
        debug: DetailsDebug {
            target_id,
            page_id,
            image_found_via,
            guide_found_via,
            variant_strategy: variant_set.strategy,
        },
    })
}

/// Find a guide frame for `name` and extract its text.
///
/// Two-phase fetch: a depth-limited tree to locate the frame id, then a
/// full-depth fetch of only that node. Failures degrade to `None`; guides
/// are optional documentation, not a required field.
async fn fetch_guide(api: &dyn FigmaApi, file_key: &str, name: &str) -> Option<String> {
    let file = match api.get_file(file_key, Some(2)).await {
        Ok(file) => file,
        Err(e) => {
            warn!(error = %e, "guide tree fetch failed");
            return None;
        }
    };
    let target_clean = clean(name);
    if target_clean.is_empty() {
        return None;
    }
    let guide_id = find_guide_frame(&file.document, &target_clean)?;
    match api.get_node(file_key, &guide_id).await {
        Ok(Some(node)) => extract_text_joined(&node),
        Ok(None) => None,
        Err(e) => {
            warn!(%guide_id, error = %e, "guide node fetch failed");
            None
        }
    }
}

fn find_guide_frame(node: &Node, target_clean: &str) -> Option<String> {
    let name_lower = node.name.to_lowercase();
    if name_lower.contains("guide") && clean(&node.name).contains(target_clean) {
        return Some(node.id.clone());
    }
    node.children
        .iter()
        .find_map(|child| find_guide_frame(child, target_clean))
}

/// Preview image: prefer a cover frame on the component's page, fall back
/// to rendering the target node directly.
async fn resolve_image(
    api: &dyn FigmaApi,
    file_key: &str,
    target_id: &str,
    target_name: &str,
    page_id: Option<&str>,
) -> (Option<String>, Option<ImageSource>) {
    if let Some(page_id) = page_id {
        match api.get_node(file_key, page_id).await {
            Ok(Some(page)) => {
                if let Some(cover_id) = find_cover(&page, &clean(target_name), 0) {
                    match api.get_image(file_key, &cover_id).await {
                        Ok(Some(url)) => return (Some(url), Some(ImageSource::Cover)),
                        Ok(None) => debug!(%cover_id, "cover render failed, trying node render"),
                        Err(e) => warn!(error = %e, "cover render errored"),
                    }
                }
            }
            Ok(None) => debug!(%page_id, "page node not found"),
            Err(e) => warn!(error = %e, "page fetch failed"),
        }
    }
    match api.get_image(file_key, target_id).await {
        Ok(Some(url)) => (Some(url), Some(ImageSource::Node)),
        Ok(None) => (None, None),
        Err(e) => {
            warn!(error = %e, "node render errored");
            (None, None)
        }
    }
}

/// A cover is a container node near the page root whose cleaned name equals
/// the cleaned target name.
fn find_cover(node: &Node, target_clean: &str, depth: usize) -> Option<String> {
    if depth > COVER_SEARCH_DEPTH {
        return None;
    }
    if node.is_container() && clean(&node.name) == target_clean {
        return Some(node.id.clone());
    }
    if node.node_type == NodeType::Canvas || node.is_container() || depth == 0 {
        return node
            .children
            .iter()
            .find_map(|child| find_cover(child, target_clean, depth + 1));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeFigma;
    use deska_figma::{ComponentSummary, ContainingFrame};

    fn summary(name: &str, node_id: &str, frame: &str, page: &str) -> ComponentSummary {
        ComponentSummary {
            key: String::new(),
            node_id: node_id.to_string(),
            name: name.to_string(),
            description: None,
            containing_frame: Some(ContainingFrame {
                name: frame.to_string(),
                node_id: None,
                page_id: Some(page.to_string()),
                page_name: None,
            }),
        }
    }

    fn text(id: &str, chars: &str) -> Node {
        Node {
            id: id.into(),
            name: "copy".into(),
            node_type: NodeType::Text,
            characters: Some(chars.into()),
            ..Default::default()
        }
    }

    fn fake_with_buttons() -> FakeFigma {
        let mut fake = FakeFigma::default();
        fake.components.insert(
            "KIT".into(),
            vec![
                summary("Primary", "10:1", "Button", "0:1"),
                summary("Secondary", "10:2", "Button", "0:1"),
            ],
        );
        // Depth-2 view of the file: a docs page holding the guide frame.
        fake.documents.insert(
            "KIT".into(),
            Node {
                id: "0:0".into(),
                name: "Document".into(),
                node_type: NodeType::Document,
                children: vec![Node {
                    id: "0:2".into(),
                    name: "Docs".into(),
                    node_type: NodeType::Canvas,
                    children: vec![Node {
                        id: "20:1".into(),
                        name: "Button / Guide".into(),
                        node_type: NodeType::Frame,
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            },
        );
        fake.nodes.insert(
            "20:1".into(),
            Node {
                id: "20:1".into(),
                name: "Button / Guide".into(),
                node_type: NodeType::Frame,
                children: vec![text("20:2", "Use for primary actions.")],
                ..Default::default()
            },
        );
        fake.nodes.insert(
            "10:1".into(),
            Node {
                id: "10:1".into(),
                name: "Primary".into(),
                node_type: NodeType::Component,
                ..Default::default()
            },
        );
        fake.images.insert("10:1".into(), "https://img.example/10-1".into());
        fake
    }

    #[tokio::test]
    async fn resolves_frame_as_target_and_collects_guide() {
        let fake = fake_with_buttons();
        let details = component_details(&fake, "KIT", "Button").await.unwrap();
        assert_eq!(details.found_name, "Button");
        assert_eq!(details.variants_count, 2);
        assert_eq!(details.guide.as_deref(), Some("Use for primary actions."));
        assert_eq!(details.debug.guide_found_via, Some(GuideSource::TargetName));
        assert_eq!(details.debug.variant_strategy, VariantStrategy::ExactFrame);
        assert!(details.figma_link.contains("node-id=10-1"));
    }

    #[tokio::test]
    async fn typo_query_still_resolves_the_frame() {
        let fake = fake_with_buttons();
        let details = component_details(&fake, "KIT", "Buton").await.unwrap();
        assert_eq!(details.found_name, "Button");
        assert_eq!(details.variants_count, 2);
    }

    #[tokio::test]
    async fn missing_guide_is_null_not_an_error() {
        let mut fake = fake_with_buttons();
        // A document with no guide frame anywhere.
        fake.documents.insert(
            "KIT".into(),
            Node {
                id: "0:0".into(),
                name: "Document".into(),
                node_type: NodeType::Document,
                ..Default::default()
            },
        );
        let details = component_details(&fake, "KIT", "Button").await.unwrap();
        assert!(details.guide.is_none());
        assert!(details.debug.guide_found_via.is_none());
    }

    #[tokio::test]
    async fn no_matches_is_a_not_found_error() {
        let fake = fake_with_buttons();
        let err = component_details(&fake, "KIT", "Carousel").await.unwrap_err();
        assert!(matches!(err, DeskaError::NotFound(_)));
    }

    #[tokio::test]
    async fn cover_frame_wins_over_direct_render() {
        let mut fake = fake_with_buttons();
        // Page 0:1 carries a top-level cover frame named like the target.
        fake.nodes.insert(
            "0:1".into(),
            Node {
                id: "0:1".into(),
                name: "Components".into(),
                node_type: NodeType::Canvas,
                children: vec![Node {
                    id: "30:1".into(),
                    name: "Button".into(),
                    node_type: NodeType::Frame,
                    ..Default::default()
                }],
                ..Default::default()
            },
        );
        fake.images.insert("30:1".into(), "https://img.example/cover".into());
        let details = component_details(&fake, "KIT", "Button").await.unwrap();
        assert_eq!(details.image_url.as_deref(), Some("https://img.example/cover"));
        assert_eq!(details.debug.image_found_via, Some(ImageSource::Cover));
    }

    #[tokio::test]
    async fn falls_back_to_node_render_without_a_cover() {
        let fake = fake_with_buttons();
        let details = component_details(&fake, "KIT", "Button").await.unwrap();
        // Target id is 10:1, the frame-matching hit.
        assert_eq!(details.image_url.as_deref(), Some("https://img.example/10-1"));
        assert_eq!(details.debug.image_found_via, Some(ImageSource::Node));
    }
}

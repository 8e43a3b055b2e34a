use crate::search::normalize;
use deska_figma::ComponentSummary;
use serde::Serialize;
use std::collections::HashMap;

/// Which cascade step produced the variant set, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantStrategy {
    ExactFrame,
    FramePrefix,
    ExactName,
    PartialName,
    NoMatch,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantSet {
    pub members: Vec<ComponentSummary>,
    pub strategy: VariantStrategy,
}

/// Resolve all sibling variants of a named component group.
///
/// Users name the group ("Button") but the API lists leaf components; the
/// group's identity is the containing frame. Increasingly loose name tests
/// are tried, and every hit is expanded to all components of its frame.
/// Source order is preserved throughout.
pub fn resolve_variants(components: &[ComponentSummary], name: &str) -> VariantSet {
    let name_norm = normalize(name);

    // 1. Exact containing-frame match.
    let frame_matches: Vec<ComponentSummary> = components
        .iter()
        .filter(|c| normalize(c.frame_name()) == name_norm)
        .cloned()
        .collect();
    if !frame_matches.is_empty() {
        return VariantSet {
            members: frame_matches,
            strategy: VariantStrategy::ExactFrame,
        };
    }

    // 2. Frame starts-with: group by frame, richest group wins. The frame
    // with the most members is usually the real variant set rather than a
    // stray "Button Deprecated" grouping.
    let prefixed: Vec<&ComponentSummary> = components
        .iter()
        .filter(|c| normalize(c.frame_name()).starts_with(&name_norm) && !c.frame_name().is_empty())
        .collect();
    if !prefixed.is_empty() {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for c in &prefixed {
            *counts.entry(c.frame_name()).or_default() += 1;
        }
        let max_count = counts.values().copied().max().unwrap_or(0);
        // Ties break on source order.
        let best_frame = prefixed
            .iter()
            .map(|c| c.frame_name())
            .find(|frame| counts[frame] == max_count)
            .unwrap_or_default();
        return VariantSet {
            members: components
                .iter()
                .filter(|c| c.frame_name() == best_frame)
                .cloned()
                .collect(),
            strategy: VariantStrategy::FramePrefix,
        };
    }

    // 3. Exact component-name match, expanded to the whole frame.
    if let Some(hit) = components.iter().find(|c| normalize(&c.name) == name_norm) {
        return VariantSet {
            members: expand_to_frame(components, hit),
            strategy: VariantStrategy::ExactName,
        };
    }

    // 4. Partial component-name containment, same expansion.
    if let Some(hit) = components
        .iter()
        .find(|c| normalize(&c.name).contains(&name_norm))
    {
        return VariantSet {
            members: expand_to_frame(components, hit),
            strategy: VariantStrategy::PartialName,
        };
    }

    VariantSet {
        members: Vec::new(),
        strategy: VariantStrategy::NoMatch,
    }
}

fn expand_to_frame(components: &[ComponentSummary], hit: &ComponentSummary) -> Vec<ComponentSummary> {
    let frame = hit.frame_name();
    if frame.is_empty() {
        return vec![hit.clone()];
    }
    components
        .iter()
        .filter(|c| c.frame_name() == frame)
        .cloned()
        .collect()
}

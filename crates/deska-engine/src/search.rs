use deska_figma::ComponentSummary;
use serde::{Deserialize, Serialize};

/// Ranking precedence for component matches, best first.
///
/// The containing frame is the semantically meaningful grouping unit (all
/// variants of "Button" live under one frame), so frame-name tiers outrank
/// leaf-name tiers at the same strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    ExactFrame,
    ExactName,
    FrameStartsWith,
    NameStartsWith,
    Fuzzy,
    Contains,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedComponent {
    pub component: ComponentSummary,
    pub tier: MatchTier,
}

pub const MAX_RESULTS: usize = 20;

/// Short cleaned queries would fuzzy-match half the file.
const MIN_FUZZY_LEN: usize = 4;

/// Lower-case and trim, for exact/prefix/substring comparisons.
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Aggressive form for fuzzy comparisons: lower-cased with spaces, hyphens
/// and underscores stripped, so "Tab Bar" == "tab-bar" == "TabBar".
pub fn clean(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// True when every char of `needle` appears in `haystack` in order.
/// Tolerates dropped letters ("Buton" against "Button"), which plain
/// substring containment does not.
fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut chars = haystack.chars();
    needle.chars().all(|n| chars.any(|h| h == n))
}

/// Cleaned fuzzy test used by the fuzzy tier and by target selection:
/// containment in either direction, or an in-order subsequence match.
pub fn fuzzy_eq(query: &str, candidate: &str) -> bool {
    let q = clean(query);
    let c = clean(candidate);
    if q.is_empty() || c.is_empty() {
        return false;
    }
    c.contains(&q) || q.contains(&c) || is_subsequence(&q, &c)
}

/// Rank a file's component list against a free-text query.
///
/// Six mutually exclusive tiers evaluated in strict order; a component is
/// claimed by the first tier it satisfies and never reappears in a later
/// one. Result is the tier concatenation, truncated to [`MAX_RESULTS`].
pub fn rank_components(query: &str, components: &[ComponentSummary]) -> Vec<RankedComponent> {
    let query_norm = normalize(query);
    let query_clean = clean(query);
    if query_norm.is_empty() {
        return Vec::new();
    }

    let mut claimed = vec![false; components.len()];
    let mut out = Vec::new();

    let mut take =
        |claimed: &mut Vec<bool>, out: &mut Vec<RankedComponent>, tier: MatchTier, pred: &dyn Fn(&ComponentSummary) -> bool| {
            for (i, component) in components.iter().enumerate() {
                if !claimed[i] && pred(component) {
                    claimed[i] = true;
                    out.push(RankedComponent {
                        component: component.clone(),
                        tier,
                    });
                }
            }
        };

    take(&mut claimed, &mut out, MatchTier::ExactFrame, &|c| {
        normalize(c.frame_name()) == query_norm
    });
    take(&mut claimed, &mut out, MatchTier::ExactName, &|c| {
        normalize(&c.name) == query_norm
    });
    take(&mut claimed, &mut out, MatchTier::FrameStartsWith, &|c| {
        normalize(c.frame_name()).starts_with(&query_norm)
    });
    take(&mut claimed, &mut out, MatchTier::NameStartsWith, &|c| {
        normalize(&c.name).starts_with(&query_norm)
    });
    if query_clean.len() >= MIN_FUZZY_LEN {
        take(&mut claimed, &mut out, MatchTier::Fuzzy, &|c| {
            let frame = clean(c.frame_name());
            let name = clean(&c.name);
            frame.contains(&query_clean)
                || name.contains(&query_clean)
                || is_subsequence(&query_clean, &frame)
                || is_subsequence(&query_clean, &name)
        });
    }
    take(&mut claimed, &mut out, MatchTier::Contains, &|c| {
        normalize(c.frame_name()).contains(&query_norm) || normalize(&c.name).contains(&query_norm)
    });

    out.truncate(MAX_RESULTS);
    out
}

//! Resolution engine for the design-system assistant.
//!
//! Everything here turns a loose natural-language name into concrete Figma
//! facts: the right component or pattern page, its variants, documentation
//! text, token bindings and a preview image. Pure matching logic is kept
//! separate from the orchestrators so it can be tested without I/O.

pub mod details;
pub mod patterns;
pub mod props;
pub mod render;
pub mod search;
pub mod text;
pub mod tokens;
pub mod universal;
pub mod url;
pub mod usage;
pub mod variants;

#[cfg(test)]
pub(crate) mod testutil;

pub use details::{component_details, ComponentDetails, GuideSource, ImageSource};
pub use patterns::{pattern_info, search_patterns, PatternInfo};
pub use render::{variant_image, VariantImage};
pub use search::{clean, fuzzy_eq, normalize, rank_components, MatchTier, RankedComponent};
pub use text::{extract_text, extract_text_joined};
pub use tokens::resolve_tokens;
pub use universal::{search_design_system, UniversalHit};
pub use url::{analyze_url, parse_figma_url, ParsedFigmaUrl, UrlAnalysis};
pub use usage::{find_component_usages, scan_usages, UsageReport};
pub use variants::{resolve_variants, VariantSet, VariantStrategy};

use crate::patterns::search_patterns;
use crate::search::rank_components;
use deska_common::{DesignSystemFiles, Result};
use deska_figma::FigmaApi;
use serde::Serialize;
use tracing::warn;

const HITS_PER_SOURCE: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct UniversalHit {
    pub name: String,
    /// "component", "organism" or "pattern".
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
}

/// Search components, organisms and patterns at once.
///
/// The three branches have no data dependency, so they are issued
/// concurrently and joined. A failing branch degrades to no hits from that
/// source rather than failing the whole search.
pub async fn search_design_system(
    api: &dyn FigmaApi,
    files: &DesignSystemFiles,
    query: &str,
) -> Result<Vec<UniversalHit>> {
    // An unset patterns key skips that branch outright instead of issuing a
    // doomed request.
    let patterns_branch = async {
        if files.patterns.is_empty() {
            warn!("patterns file key not configured, skipping pattern search");
            Ok(Vec::new())
        } else {
            search_patterns(api, &files.patterns, query).await
        }
    };
    let (components, organisms, patterns) = tokio::join!(
        api.get_file_components(&files.ui_kit),
        api.get_file_components(&files.organisms),
        patterns_branch,
    );

    let mut hits = Vec::new();
    for (result, source) in [(components, "component"), (organisms, "organism")] {
        match result {
            Ok(listing) => {
                hits.extend(rank_components(query, &listing).into_iter().take(HITS_PER_SOURCE).map(
                    |r| UniversalHit {
                        name: r.component.name.clone(),
                        source,
                        frame: r
                            .component
                            .containing_frame
                            .as_ref()
                            .map(|f| f.name.clone()),
                    },
                ));
            }
            Err(e) => warn!(source, error = %e, "universal search branch failed"),
        }
    }
    match patterns {
        Ok(pages) => hits.extend(pages.into_iter().take(HITS_PER_SOURCE).map(|name| UniversalHit {
            name,
            source: "pattern",
            frame: None,
        })),
        Err(e) => warn!(source = "pattern", error = %e, "universal search branch failed"),
    }
    Ok(hits)
}

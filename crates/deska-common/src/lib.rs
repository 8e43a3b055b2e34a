use serde::{Deserialize, Serialize};

/// Common error taxonomy for the assistant.
///
/// `NotFound` is not exceptional: the tool boundary renders it as a
/// structured `{"error": "..."}` payload instead of failing the call.
#[derive(thiserror::Error, Debug)]
pub enum DeskaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Figma API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("{0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LLM API error: {0}")]
    Llm(String),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DeskaError>;

/// File keys of the design-system files the assistant knows about.
///
/// The UI kit holds atomic components, the organisms file holds composite
/// components, and the patterns file holds one UX-rule topic per page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignSystemFiles {
    pub ui_kit: String,
    pub organisms: String,
    pub patterns: String,
}

impl DesignSystemFiles {
    pub fn from_env() -> Self {
        Self {
            ui_kit: std::env::var("FIGMA_UI_KIT_FILE_KEY")
                .unwrap_or_else(|_| "fRi3HAgxLDuHW4MJQPf5r3".to_string()),
            organisms: std::env::var("FIGMA_ORGANISMS_FILE_KEY")
                .unwrap_or_else(|_| "JbfXQWGV0BhKVA1RLwn5V9".to_string()),
            patterns: std::env::var("FIGMA_PATTERNS_FILE_KEY").unwrap_or_default(),
        }
    }

    /// Resolve a friendly alias ("ui-kit", "icons", ...) to a file key.
    /// Unknown aliases are assumed to already be file keys.
    pub fn resolve_alias(&self, name: &str) -> String {
        match name.to_lowercase().as_str() {
            "ui-kit" | "ui kit" => self.ui_kit.clone(),
            "organisms" => self.organisms.clone(),
            "patterns" => self.patterns.clone(),
            "foundation" => "4ELwCVLtFVJEOvTWTMgzoc".to_string(),
            "content" => "orK6ik3Y3jz9Kdae26Xd4D".to_string(),
            "local-components" => "FwE8tG9F5b1tzOCiwEia1b".to_string(),
            "icons" => "YcLaNNYi7TSdzgidXCNVmv".to_string(),
            "logos" => "dhbvT9HFmKPsPjFP5dVBjl".to_string(),
            "cards" => "cIVBzK29WPCdAcxu51JKD8".to_string(),
            "graphics" => "gsYPhh1TIxL59UmGR1281c".to_string(),
            "illustrations" => "mgdGa7yTGTBDFpcjfnbeVF".to_string(),
            "pictograms" => "p6eSfKFu7XHBWi5P6u62C5".to_string(),
            "infrastructure" => "D4nh89Loek8sSkNlrtqM9a".to_string(),
            "deprecated" => "HOABEIUXJL5CvA2yHNEN5Q".to_string(),
            "design-update" => "ZSaVtJHZgv30Zu1s21O6Ib".to_string(),
            _ => name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_falls_through_to_raw_key() {
        let files = DesignSystemFiles {
            ui_kit: "KIT".into(),
            organisms: "ORG".into(),
            patterns: "PAT".into(),
        };
        assert_eq!(files.resolve_alias("ui-kit"), "KIT");
        assert_eq!(files.resolve_alias("Organisms"), "ORG");
        assert_eq!(files.resolve_alias("icons"), "YcLaNNYi7TSdzgidXCNVmv");
        assert_eq!(files.resolve_alias("abcdef1234"), "abcdef1234");
    }
}

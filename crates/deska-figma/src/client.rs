use crate::types::*;
use async_trait::async_trait;
use deska_common::{DeskaError, Result};
use reqwest::Client;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

pub const FIGMA_API_BASE: &str = "https://api.figma.com/v1";

/// Read surface of the Figma REST API the engine needs.
///
/// Behind a trait so orchestrators can run against an in-memory double; the
/// single production implementation is [`FigmaClient`].
#[async_trait]
pub trait FigmaApi: Send + Sync {
    /// Fetch a file's document tree, optionally depth-limited.
    async fn get_file(&self, file_key: &str, depth: Option<u8>) -> Result<FileResponse>;

    /// Fetch specific nodes at full depth, keyed by node id.
    async fn get_nodes(&self, file_key: &str, ids: &[String]) -> Result<HashMap<String, Node>>;

    /// Fetch a single node, `None` when the id does not resolve.
    async fn get_node(&self, file_key: &str, node_id: &str) -> Result<Option<Node>> {
        let mut nodes = self.get_nodes(file_key, &[node_id.to_string()]).await?;
        Ok(nodes.remove(node_id))
    }

    /// Render a node as PNG and return its URL; `None` on render failure.
    async fn get_image(&self, file_key: &str, node_id: &str) -> Result<Option<String>>;

    /// Bulk component listing for a file.
    async fn get_file_components(&self, file_key: &str) -> Result<Vec<ComponentSummary>>;

    /// Style id -> name map, keyed by both `node_id` and `key`. The upstream
    /// contract is ambiguous about which of the two a node's style reference
    /// uses, so both are merged into one lookup map.
    async fn get_file_styles(&self, file_key: &str) -> Result<HashMap<String, String>>;

    /// Local variable id -> name map.
    async fn get_file_variables(&self, file_key: &str) -> Result<HashMap<String, String>>;

    /// Raw comment listing.
    async fn get_comments(&self, file_key: &str) -> Result<serde_json::Value>;

    /// Post a comment, optionally as a reply. The only write the assistant
    /// ever performs.
    async fn post_comment(
        &self,
        file_key: &str,
        message: &str,
        parent_id: Option<&str>,
    ) -> Result<serde_json::Value>;

    /// Delete a comment.
    async fn delete_comment(&self, file_key: &str, comment_id: &str) -> Result<serde_json::Value>;

    /// List a comment's reactions.
    async fn get_reactions(&self, file_key: &str, comment_id: &str) -> Result<serde_json::Value>;

    /// Add an emoji reaction to a comment.
    async fn post_reaction(
        &self,
        file_key: &str,
        comment_id: &str,
        emoji: &str,
    ) -> Result<serde_json::Value>;

    /// Remove an emoji reaction from a comment.
    async fn delete_reaction(
        &self,
        file_key: &str,
        comment_id: &str,
        emoji: &str,
    ) -> Result<serde_json::Value>;
}

/// Timeouts per call class: whole-file tree fetches are allowed to be slow,
/// single-node and image fetches are not.
#[derive(Debug, Clone)]
pub struct FigmaConfig {
    pub api_key: String,
    pub timeout: Duration,
    pub listing_timeout: Duration,
    pub file_timeout: Duration,
}

impl FigmaConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            timeout: Duration::from_secs(30),
            listing_timeout: Duration::from_secs(60),
            file_timeout: Duration::from_secs(120),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("FIGMA_API_KEY")
            .map_err(|_| DeskaError::Config("FIGMA_API_KEY environment variable is required".into()))?;
        Ok(Self::new(api_key))
    }
}

/// Explicitly constructed client; no global singleton, so tests and parallel
/// sessions can hold isolated instances.
pub struct FigmaClient {
    client: Client,
    config: FigmaConfig,
}

impl FigmaClient {
    pub fn new(config: FigmaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(FigmaConfig::from_env()?))
    }

    async fn get(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<reqwest::Response> {
        let url = format!("{FIGMA_API_BASE}{endpoint}");
        debug!(%url, "figma request");
        let response = self
            .client
            .get(&url)
            .query(params)
            .header("X-Figma-Token", &self.config.api_key)
            .timeout(timeout)
            .send()
            .await?;
        Ok(response)
    }

    /// GET that must succeed; non-2xx aborts the operation.
    async fn get_required(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<reqwest::Response> {
        let response = self.get(endpoint, params, timeout).await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DeskaError::Upstream { status, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl FigmaApi for FigmaClient {
    async fn get_file(&self, file_key: &str, depth: Option<u8>) -> Result<FileResponse> {
        let mut params = Vec::new();
        if let Some(depth) = depth {
            params.push(("depth", depth.to_string()));
        }
        let response = self
            .get_required(&format!("/files/{file_key}"), &params, self.config.file_timeout)
            .await?;
        Ok(response.json().await?)
    }

    async fn get_nodes(&self, file_key: &str, ids: &[String]) -> Result<HashMap<String, Node>> {
        let params = [("ids", ids.join(","))];
        let response = self
            .get_required(&format!("/files/{file_key}/nodes"), &params, self.config.timeout)
            .await?;
        let parsed: NodesResponse = response.json().await?;
        Ok(parsed
            .nodes
            .into_iter()
            .map(|(id, entry)| (id, entry.document))
            .collect())
    }

    async fn get_image(&self, file_key: &str, node_id: &str) -> Result<Option<String>> {
        let params = [
            ("ids", node_id.to_string()),
            ("format", "png".to_string()),
            ("scale", "2".to_string()),
        ];
        let response = self
            .get(&format!("/images/{file_key}"), &params, self.config.timeout)
            .await?;
        if !response.status().is_success() {
            warn!(node_id, status = %response.status(), "image render failed");
            return Ok(None);
        }
        let parsed: ImagesResponse = response.json().await?;
        Ok(parsed.images.get(node_id).cloned().flatten())
    }

    async fn get_file_components(&self, file_key: &str) -> Result<Vec<ComponentSummary>> {
        let response = self
            .get_required(
                &format!("/files/{file_key}/components"),
                &[],
                self.config.listing_timeout,
            )
            .await?;
        let parsed: ComponentsResponse = response.json().await?;
        Ok(parsed.meta.components)
    }

    async fn get_file_styles(&self, file_key: &str) -> Result<HashMap<String, String>> {
        let response = self
            .get(&format!("/files/{file_key}/styles"), &[], self.config.timeout)
            .await?;
        if !response.status().is_success() {
            warn!(status = %response.status(), "style listing failed, continuing without styles");
            return Ok(HashMap::new());
        }
        let parsed: StylesResponse = response.json().await?;
        let mut map = HashMap::new();
        for style in parsed.meta.styles {
            if !style.node_id.is_empty() {
                map.insert(style.node_id, style.name.clone());
            }
            if !style.key.is_empty() {
                map.insert(style.key, style.name);
            }
        }
        Ok(map)
    }

    async fn get_file_variables(&self, file_key: &str) -> Result<HashMap<String, String>> {
        let response = self
            .get(&format!("/files/{file_key}/variables/local"), &[], self.config.timeout)
            .await?;
        if !response.status().is_success() {
            warn!(status = %response.status(), "variable listing failed, continuing without variables");
            return Ok(HashMap::new());
        }
        let parsed: VariablesResponse = response.json().await?;
        Ok(parsed
            .meta
            .variables
            .into_iter()
            .map(|v| (v.id, v.name))
            .collect())
    }

    async fn get_comments(&self, file_key: &str) -> Result<serde_json::Value> {
        let response = self
            .get_required(&format!("/files/{file_key}/comments"), &[], self.config.timeout)
            .await?;
        Ok(response.json().await?)
    }

    async fn post_comment(
        &self,
        file_key: &str,
        message: &str,
        parent_id: Option<&str>,
    ) -> Result<serde_json::Value> {
        let mut body = json!({ "message": message });
        if let Some(parent) = parent_id {
            body["comment_id"] = json!(parent);
        }
        let url = format!("{FIGMA_API_BASE}/files/{file_key}/comments");
        let response = self
            .client
            .post(&url)
            .header("X-Figma-Token", &self.config.api_key)
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DeskaError::Upstream { status, body });
        }
        Ok(response.json().await?)
    }

    async fn delete_comment(&self, file_key: &str, comment_id: &str) -> Result<serde_json::Value> {
        let url = format!("{FIGMA_API_BASE}/files/{file_key}/comments/{comment_id}");
        let response = self
            .client
            .delete(&url)
            .header("X-Figma-Token", &self.config.api_key)
            .timeout(self.config.timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DeskaError::Upstream { status, body });
        }
        Ok(response.json().await.unwrap_or(json!({})))
    }

    async fn get_reactions(
        &self,
        file_key: &str,
        comment_id: &str,
    ) -> Result<serde_json::Value> {
        let response = self
            .get_required(
                &format!("/files/{file_key}/comments/{comment_id}/reactions"),
                &[],
                self.config.timeout,
            )
            .await?;
        Ok(response.json().await?)
    }

    async fn post_reaction(
        &self,
        file_key: &str,
        comment_id: &str,
        emoji: &str,
    ) -> Result<serde_json::Value> {
        let url = format!("{FIGMA_API_BASE}/files/{file_key}/comments/{comment_id}/reactions");
        let response = self
            .client
            .post(&url)
            .header("X-Figma-Token", &self.config.api_key)
            .timeout(self.config.timeout)
            .json(&json!({ "emoji": emoji }))
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DeskaError::Upstream { status, body });
        }
        Ok(response.json().await.unwrap_or(json!({})))
    }

    async fn delete_reaction(
        &self,
        file_key: &str,
        comment_id: &str,
        emoji: &str,
    ) -> Result<serde_json::Value> {
        let url = format!("{FIGMA_API_BASE}/files/{file_key}/comments/{comment_id}/reactions");
        let response = self
            .client
            .delete(&url)
            .header("X-Figma-Token", &self.config.api_key)
            .timeout(self.config.timeout)
            .query(&[("emoji", emoji)])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DeskaError::Upstream { status, body });
        }
        Ok(response.json().await.unwrap_or(json!({})))
    }
}

/// Deep link to a node in the design tool; node ids use dashes in URLs.
pub fn deep_link(file_key: &str, node_id: &str) -> String {
    format!(
        "https://www.figma.com/design/{file_key}?node-id={}",
        node_id.replace(':', "-")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_link_swaps_colon_for_dash() {
        assert_eq!(
            deep_link("ABC123", "12:34"),
            "https://www.figma.com/design/ABC123?node-id=12-34"
        );
    }

    #[test]
    fn config_requires_api_key() {
        // Only checks the error shape; does not touch process env.
        let err = DeskaError::Config("FIGMA_API_KEY environment variable is required".into());
        assert!(err.to_string().contains("FIGMA_API_KEY"));
    }
}

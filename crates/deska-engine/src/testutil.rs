use async_trait::async_trait;
use deska_common::{DeskaError, Result};
use deska_figma::{ComponentSummary, FigmaApi, FileResponse, Node};
use serde_json::json;
use std::collections::HashMap;

/// In-memory Figma double for orchestrator tests.
///
/// Depth parameters are ignored; fixtures are built already shaped the way
/// the depth-limited endpoints would return them.
#[derive(Default)]
pub struct FakeFigma {
    /// file key -> component listing
    pub components: HashMap<String, Vec<ComponentSummary>>,
    /// file key -> document tree
    pub documents: HashMap<String, Node>,
    /// node id -> node (shared across files; ids are unique in fixtures)
    pub nodes: HashMap<String, Node>,
    /// node id -> rendered image URL
    pub images: HashMap<String, String>,
    pub variables: HashMap<String, String>,
    pub styles: HashMap<String, String>,
}

#[async_trait]
impl FigmaApi for FakeFigma {
    async fn get_file(&self, file_key: &str, _depth: Option<u8>) -> Result<FileResponse> {
        let document = self
            .documents
            .get(file_key)
            .cloned()
            .ok_or_else(|| DeskaError::Upstream {
                status: 404,
                body: format!("no fixture for file {file_key}"),
            })?;
        Ok(FileResponse {
            document,
            name: file_key.to_string(),
        })
    }

    async fn get_nodes(&self, _file_key: &str, ids: &[String]) -> Result<HashMap<String, Node>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.nodes.get(id).map(|n| (id.clone(), n.clone())))
            .collect())
    }

    async fn get_image(&self, _file_key: &str, node_id: &str) -> Result<Option<String>> {
        Ok(self.images.get(node_id).cloned())
    }

    async fn get_file_components(&self, file_key: &str) -> Result<Vec<ComponentSummary>> {
        Ok(self.components.get(file_key).cloned().unwrap_or_default())
    }

    async fn get_file_styles(&self, _file_key: &str) -> Result<HashMap<String, String>> {
        Ok(self.styles.clone())
    }

    async fn get_file_variables(&self, _file_key: &str) -> Result<HashMap<String, String>> {
        Ok(self.variables.clone())
    }

    async fn get_comments(&self, _file_key: &str) -> Result<serde_json::Value> {
        Ok(json!({ "comments": [] }))
    }

    async fn post_comment(
        &self,
        _file_key: &str,
        message: &str,
        _parent_id: Option<&str>,
    ) -> Result<serde_json::Value> {
        Ok(json!({ "message": message }))
    }

    async fn delete_comment(&self, _file_key: &str, _comment_id: &str) -> Result<serde_json::Value> {
        Ok(json!({}))
    }

    async fn get_reactions(
        &self,
        _file_key: &str,
        _comment_id: &str,
    ) -> Result<serde_json::Value> {
        Ok(json!({ "reactions": [] }))
    }

    async fn post_reaction(
        &self,
        _file_key: &str,
        _comment_id: &str,
        emoji: &str,
    ) -> Result<serde_json::Value> {
        Ok(json!({ "emoji": emoji }))
    }

    async fn delete_reaction(
        &self,
        _file_key: &str,
        _comment_id: &str,
        _emoji: &str,
    ) -> Result<serde_json::Value> {
        Ok(json!({}))
    }
}

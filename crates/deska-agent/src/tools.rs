use crate::{ToolHandler, ToolRegistry};
use async_trait::async_trait;
use deska_common::{DesignSystemFiles, DeskaError, Result};
use deska_engine as engine;
use deska_figma::FigmaApi;
use deska_llm::ToolSpec;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Serialize an engine result for the model: either the payload or a single
/// human-readable `{"error": "..."}` object, never a thrown failure.
fn reply<T: Serialize>(result: Result<T>) -> Value {
    match result {
        Ok(payload) => serde_json::to_value(payload)
            .unwrap_or_else(|e| json!({ "error": format!("Serialization failed: {e}") })),
        Err(e) => json!({ "error": e.to_string() }),
    }
}

fn str_arg(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn missing(key: &str) -> Value {
    json!({ "error": format!("Missing required argument: {key}") })
}

/// Shared context every handler closes over.
#[derive(Clone)]
struct ToolContext {
    api: Arc<dyn FigmaApi>,
    files: DesignSystemFiles,
}

impl ToolContext {
    fn file_key(&self, args: &Value) -> String {
        let alias = str_arg(args, "file").unwrap_or_else(|| "ui-kit".to_string());
        self.files.resolve_alias(&alias)
    }

    fn patterns_key(&self) -> Result<&str> {
        if self.files.patterns.is_empty() {
            return Err(DeskaError::Config(
                "FIGMA_PATTERNS_FILE_KEY is not configured".into(),
            ));
        }
        Ok(&self.files.patterns)
    }
}

/// Build the standard tool set over one Figma client.
pub fn default_registry(api: Arc<dyn FigmaApi>, files: DesignSystemFiles) -> ToolRegistry {
    let ctx = ToolContext { api, files };
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ComponentDetailsTool(ctx.clone())));
    registry.register(Box::new(VariantImageTool(ctx.clone())));
    registry.register(Box::new(PatternInfoTool(ctx.clone())));
    registry.register(Box::new(SearchComponentsTool(ctx.clone())));
    registry.register(Box::new(UniversalSearchTool(ctx.clone())));
    registry.register(Box::new(AnalyzeUrlTool(ctx.clone())));
    registry.register(Box::new(GetCommentsTool(ctx.clone())));
    registry.register(Box::new(PostCommentTool(ctx.clone())));
    registry.register(Box::new(DeleteCommentTool(ctx.clone())));
    registry.register(Box::new(GetReactionsTool(ctx.clone())));
    registry.register(Box::new(PostReactionTool(ctx.clone())));
    registry.register(Box::new(DeleteReactionTool(ctx)));
    registry
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({ "type": "object", "properties": properties, "required": required })
}

struct ComponentDetailsTool(ToolContext);

#[async_trait]
impl ToolHandler for ComponentDetailsTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_component_details".into(),
            description: "Full details for a UI component: guide text, variants, \
                          design tokens, property summary, preview image and deep link. \
                          Use for any 'tell me about X' component question."
                .into(),
            parameters: object_schema(
                json!({
                    "component_name": { "type": "string", "description": "Component name, e.g. 'Button'" },
                    "file": { "type": "string", "description": "File alias (default 'ui-kit')" }
                }),
                &["component_name"],
            ),
        }
    }

    async fn call(&self, args: Value) -> Value {
        let Some(name) = str_arg(&args, "component_name") else {
            return missing("component_name");
        };
        let file_key = self.0.file_key(&args);
        reply(engine::component_details(self.0.api.as_ref(), &file_key, &name).await)
    }
}

struct VariantImageTool(ToolContext);

#[async_trait]
impl ToolHandler for VariantImageTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_variant_image".into(),
            description: "Render the image of one specific component variant, picked by a \
                          free-text description like 'primary small disabled'."
                .into(),
            parameters: object_schema(
                json!({
                    "component_name": { "type": "string" },
                    "description": { "type": "string", "description": "Desired properties" },
                    "file": { "type": "string" }
                }),
                &["component_name", "description"],
            ),
        }
    }

    async fn call(&self, args: Value) -> Value {
        let Some(name) = str_arg(&args, "component_name") else {
            return missing("component_name");
        };
        let Some(description) = str_arg(&args, "description") else {
            return missing("description");
        };
        let file_key = self.0.file_key(&args);
        reply(engine::variant_image(self.0.api.as_ref(), &file_key, &name, &description).await)
    }
}

struct PatternInfoTool(ToolContext);

#[async_trait]
impl ToolHandler for PatternInfoTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_pattern_info".into(),
            description: "Details for a UX pattern (validation, forms, navigation, ...): \
                          written rules, example frames, preview and related patterns. \
                          Patterns live in a separate file from components."
                .into(),
            parameters: object_schema(
                json!({ "pattern_name": { "type": "string" } }),
                &["pattern_name"],
            ),
        }
    }

    async fn call(&self, args: Value) -> Value {
        let Some(name) = str_arg(&args, "pattern_name") else {
            return missing("pattern_name");
        };
        let patterns_key = match self.0.patterns_key() {
            Ok(key) => key.to_string(),
            Err(e) => return json!({ "error": e.to_string() }),
        };
        reply(engine::pattern_info(self.0.api.as_ref(), &patterns_key, &name).await)
    }
}

struct SearchComponentsTool(ToolContext);

#[async_trait]
impl ToolHandler for SearchComponentsTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "search_components".into(),
            description: "Fuzzy search for components by name in one file.".into(),
            parameters: object_schema(
                json!({
                    "query": { "type": "string" },
                    "file": { "type": "string" }
                }),
                &["query"],
            ),
        }
    }

    async fn call(&self, args: Value) -> Value {
        let Some(query) = str_arg(&args, "query") else {
            return missing("query");
        };
        let file_key = self.0.file_key(&args);
        let result = self.0.api.get_file_components(&file_key).await.map(|components| {
            engine::rank_components(&query, &components)
                .into_iter()
                .map(|r| {
                    json!({
                        "name": r.component.name,
                        "node_id": r.component.node_id,
                        "frame": r.component.frame_name(),
                        "tier": r.tier,
                    })
                })
                .collect::<Vec<_>>()
        });
        reply(result)
    }
}

struct UniversalSearchTool(ToolContext);

#[async_trait]
impl ToolHandler for UniversalSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "search_design_system".into(),
            description: "Search everywhere at once: components, organisms and patterns. \
                          Use as a fallback when unsure where something lives."
                .into(),
            parameters: object_schema(json!({ "query": { "type": "string" } }), &["query"]),
        }
    }

    async fn call(&self, args: Value) -> Value {
        let Some(query) = str_arg(&args, "query") else {
            return missing("query");
        };
        reply(engine::search_design_system(self.0.api.as_ref(), &self.0.files, &query).await)
    }
}

struct AnalyzeUrlTool(ToolContext);

#[async_trait]
impl ToolHandler for AnalyzeUrlTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "analyze_figma_url".into(),
            description: "Identify the component behind a Figma share URL and return its \
                          details. Optionally scans the file for instance usages (slow)."
                .into(),
            parameters: object_schema(
                json!({
                    "url": { "type": "string" },
                    "include_usages": { "type": "boolean", "description": "Default false" }
                }),
                &["url"],
            ),
        }
    }

    async fn call(&self, args: Value) -> Value {
        let Some(url) = str_arg(&args, "url") else {
            return missing("url");
        };
        let include_usages = args
            .get("include_usages")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        reply(engine::analyze_url(self.0.api.as_ref(), &url, include_usages).await)
    }
}

struct GetCommentsTool(ToolContext);

#[async_trait]
impl ToolHandler for GetCommentsTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_comments".into(),
            description: "Read the comments of a design file.".into(),
            parameters: object_schema(json!({ "file": { "type": "string" } }), &[]),
        }
    }

    async fn call(&self, args: Value) -> Value {
        let file_key = self.0.file_key(&args);
        reply(self.0.api.get_comments(&file_key).await)
    }
}

struct PostCommentTool(ToolContext);

#[async_trait]
impl ToolHandler for PostCommentTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "post_comment".into(),
            description: "Post a comment to a design file, optionally replying to an \
                          existing comment."
                .into(),
            parameters: object_schema(
                json!({
                    "message": { "type": "string" },
                    "file": { "type": "string" },
                    "parent_id": { "type": "string", "description": "Comment id to reply to" }
                }),
                &["message"],
            ),
        }
    }

    async fn call(&self, args: Value) -> Value {
        let Some(message) = str_arg(&args, "message") else {
            return missing("message");
        };
        let file_key = self.0.file_key(&args);
        let parent = str_arg(&args, "parent_id");
        reply(
            self.0
                .api
                .post_comment(&file_key, &message, parent.as_deref())
                .await,
        )
    }
}

struct DeleteCommentTool(ToolContext);

#[async_trait]
impl ToolHandler for DeleteCommentTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "delete_comment".into(),
            description: "Delete a comment from a design file.".into(),
            parameters: object_schema(
                json!({
                    "comment_id": { "type": "string" },
                    "file": { "type": "string" }
                }),
                &["comment_id"],
            ),
        }
    }

    async fn call(&self, args: Value) -> Value {
        let Some(comment_id) = str_arg(&args, "comment_id") else {
            return missing("comment_id");
        };
        let file_key = self.0.file_key(&args);
        reply(self.0.api.delete_comment(&file_key, &comment_id).await)
    }
}

struct GetReactionsTool(ToolContext);

#[async_trait]
impl ToolHandler for GetReactionsTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_comment_reactions".into(),
            description: "List the emoji reactions on a comment.".into(),
            parameters: object_schema(
                json!({
                    "comment_id": { "type": "string" },
                    "file": { "type": "string" }
                }),
                &["comment_id"],
            ),
        }
    }

    async fn call(&self, args: Value) -> Value {
        let Some(comment_id) = str_arg(&args, "comment_id") else {
            return missing("comment_id");
        };
        let file_key = self.0.file_key(&args);
        reply(self.0.api.get_reactions(&file_key, &comment_id).await)
    }
}

struct PostReactionTool(ToolContext);

#[async_trait]
impl ToolHandler for PostReactionTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "post_comment_reaction".into(),
            description: "Add an emoji reaction to a comment.".into(),
            parameters: object_schema(
                json!({
                    "comment_id": { "type": "string" },
                    "emoji": { "type": "string" },
                    "file": { "type": "string" }
                }),
                &["comment_id", "emoji"],
            ),
        }
    }

    async fn call(&self, args: Value) -> Value {
        let Some(comment_id) = str_arg(&args, "comment_id") else {
            return missing("comment_id");
        };
        let Some(emoji) = str_arg(&args, "emoji") else {
            return missing("emoji");
        };
        let file_key = self.0.file_key(&args);
        reply(self.0.api.post_reaction(&file_key, &comment_id, &emoji).await)
    }
}

struct DeleteReactionTool(ToolContext);

#[async_trait]
impl ToolHandler for DeleteReactionTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "delete_comment_reaction".into(),
            description: "Remove an emoji reaction from a comment.".into(),
            parameters: object_schema(
                json!({
                    "comment_id": { "type": "string" },
                    "emoji": { "type": "string" },
                    "file": { "type": "string" }
                }),
                &["comment_id", "emoji"],
            ),
        }
    }

    async fn call(&self, args: Value) -> Value {
        let Some(comment_id) = str_arg(&args, "comment_id") else {
            return missing("comment_id");
        };
        let Some(emoji) = str_arg(&args, "emoji") else {
            return missing("emoji");
        };
        let file_key = self.0.file_key(&args);
        reply(self.0.api.delete_reaction(&file_key, &comment_id, &emoji).await)
    }
}

mod gemini;

pub use gemini::GeminiClient;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One turn of the conversation, including tool-call turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Turn {
    User(String),
    Assistant(String),
    /// The model asked for a tool invocation.
    AssistantCall(ToolCall),
    /// The result we fed back for a tool invocation.
    ToolResult { name: String, value: serde_json::Value },
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub args: serde_json::Value,
}

/// Declaration of a callable tool, advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON-schema object describing the arguments.
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Default)]
pub struct LLMResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone)]
pub struct LLMConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.7,
        }
    }
}

/// Trait for model backends that support tool calling.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(
        &self,
        system: &str,
        turns: &[Turn],
        tools: &[ToolSpec],
    ) -> Result<LLMResponse>;
}

use crate::ToolRegistry;
use anyhow::{Context, Result};
use deska_llm::{LLMProvider, Turn};
use std::sync::Arc;
use tracing::{debug, warn};

/// Upper bound on model <-> tool round-trips for one user question.
const MAX_TOOL_ROUNDS: usize = 6;

pub const SYSTEM_PROMPT: &str = "\
You are an assistant for a Figma design system.

Sources:
- Components (UI kit): atomic elements like Button, Input, Badge, Tab Bar.
- Organisms: composite components like Page Header or Payment Widget.
- Patterns: UX rules like validation, forms, navigation, one topic per page.

Strategy:
1. Question about a UI element -> get_component_details(name).
2. Question about rules/behaviour -> get_pattern_info(name).
3. Unsure or nothing found -> search_design_system(query); it searches everywhere.
4. Topic could be both (Modal, Tooltip) -> call both tools.
5. Asked to show a specific variant -> get_variant_image(name, properties).
6. Given a Figma link -> analyze_figma_url(url).

Use props.summary to describe a component instead of listing every variant.
Never invent rules; if a result has an error field, say what failed.
Always include the Figma deep link in the answer.";

/// Drives one conversation: user text in, tool calls executed, final model
/// text out.
pub struct ChatSession {
    llm: Arc<dyn LLMProvider>,
    tools: ToolRegistry,
    system_prompt: String,
    turns: Vec<Turn>,
}

impl ChatSession {
    pub fn new(llm: Arc<dyn LLMProvider>, tools: ToolRegistry) -> Self {
        Self {
            llm,
            tools,
            system_prompt: SYSTEM_PROMPT.to_string(),
            turns: Vec::new(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Ask one question. Tool calls requested by the model are executed and
    /// fed back until it produces a plain text answer or the round budget
    /// runs out.
    pub async fn ask(&mut self, question: &str) -> Result<String> {
        self.turns.push(Turn::User(question.to_string()));
        let specs = self.tools.specs();

        for round in 0..MAX_TOOL_ROUNDS {
            let response = self
                .llm
                .generate(&self.system_prompt, &self.turns, &specs)
                .await
                .context("model call failed")?;

            if response.tool_calls.is_empty() {
                self.turns.push(Turn::Assistant(response.content.clone()));
                return Ok(response.content);
            }

            debug!(round, calls = response.tool_calls.len(), "executing tool calls");
            for call in response.tool_calls {
                let value = self.tools.dispatch(&call).await;
                self.turns.push(Turn::AssistantCall(call.clone()));
                self.turns.push(Turn::ToolResult {
                    name: call.name,
                    value,
                });
            }
        }

        warn!("tool round budget exhausted");
        anyhow::bail!("The model kept requesting tools without answering")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolHandler;
    use async_trait::async_trait;
    use deska_llm::{LLMResponse, ToolCall, ToolSpec};
    use serde_json::json;
    use std::sync::Mutex;

    /// Scripted provider: pops one canned response per call.
    struct Scripted(Mutex<Vec<LLMResponse>>);

    #[async_trait]
    impl LLMProvider for Scripted {
        async fn generate(
            &self,
            _system: &str,
            _turns: &[Turn],
            _tools: &[ToolSpec],
        ) -> Result<LLMResponse> {
            Ok(self.0.lock().unwrap().remove(0))
        }
    }

    struct Lookup;

    #[async_trait]
    impl ToolHandler for Lookup {
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "lookup".into(),
                description: "test".into(),
                parameters: json!({ "type": "object", "properties": {} }),
            }
        }

        async fn call(&self, _args: serde_json::Value) -> serde_json::Value {
            json!({ "found_name": "Button" })
        }
    }

    #[tokio::test]
    async fn tool_calls_are_executed_then_answer_returned() {
        let scripted = Scripted(Mutex::new(vec![
            LLMResponse {
                content: String::new(),
                tool_calls: vec![ToolCall { name: "lookup".into(), args: json!({}) }],
            },
            LLMResponse {
                content: "It is the Button component.".into(),
                tool_calls: vec![],
            },
        ]));
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(Lookup));

        let mut session = ChatSession::new(Arc::new(scripted), registry);
        let answer = session.ask("What is Button?").await.unwrap();
        assert_eq!(answer, "It is the Button component.");
        // user, call, tool result, assistant answer
        assert_eq!(session.turns.len(), 4);
    }

    #[tokio::test]
    async fn runaway_tool_loops_are_cut_off() {
        let loops: Vec<LLMResponse> = (0..MAX_TOOL_ROUNDS)
            .map(|_| LLMResponse {
                content: String::new(),
                tool_calls: vec![ToolCall { name: "lookup".into(), args: json!({}) }],
            })
            .collect();
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(Lookup));

        let mut session = ChatSession::new(Arc::new(Scripted(Mutex::new(loops))), registry);
        assert!(session.ask("loop forever").await.is_err());
    }
}

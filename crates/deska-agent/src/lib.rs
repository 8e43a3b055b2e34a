//! Tool-invocation boundary between the model and the resolution engine.

pub mod session;
pub mod tools;

pub use session::ChatSession;
pub use tools::default_registry;

use async_trait::async_trait;
use deska_llm::{ToolCall, ToolSpec};
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, warn};

/// One callable tool: a declaration for the model plus a JSON-in/JSON-out
/// handler. Handlers never fail the call; engine errors come back as
/// `{"error": "..."}` payloads for the model to read.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn spec(&self) -> ToolSpec;
    async fn call(&self, args: serde_json::Value) -> serde_json::Value;
}

#[derive(Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Box<dyn ToolHandler>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Box<dyn ToolHandler>) {
        let name = handler.spec().name;
        self.order.push(name.clone());
        self.handlers.insert(name, handler);
    }

    /// Declarations in registration order, for the model request.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.order
            .iter()
            .filter_map(|name| self.handlers.get(name))
            .map(|h| h.spec())
            .collect()
    }

    pub async fn dispatch(&self, call: &ToolCall) -> serde_json::Value {
        match self.handlers.get(&call.name) {
            Some(handler) => {
                info!(tool = %call.name, "dispatching tool call");
                handler.call(call.args.clone()).await
            }
            None => {
                warn!(tool = %call.name, "model requested an unknown tool");
                json!({ "error": format!("Unknown tool: {}", call.name) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "echo".into(),
                description: "Echo the arguments".into(),
                parameters: json!({ "type": "object", "properties": {} }),
            }
        }

        async fn call(&self, args: serde_json::Value) -> serde_json::Value {
            args
        }
    }

    #[tokio::test]
    async fn dispatch_routes_by_name_and_flags_unknown_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(Echo));

        let known = registry
            .dispatch(&ToolCall { name: "echo".into(), args: json!({ "x": 1 }) })
            .await;
        assert_eq!(known["x"], 1);

        let unknown = registry
            .dispatch(&ToolCall { name: "nope".into(), args: json!({}) })
            .await;
        assert!(unknown["error"].as_str().unwrap().contains("nope"));
    }
}

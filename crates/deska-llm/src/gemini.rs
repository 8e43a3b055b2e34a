use crate::{LLMConfig, LLMProvider, LLMResponse, ToolCall, ToolSpec, Turn};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

pub struct GeminiClient {
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl GeminiClient {
    pub fn new(config: LLMConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            anyhow::bail!("Gemini API key is required");
        }

        Ok(Self {
            api_key: config.api_key,
            model: config.model,
            temperature: config.temperature,
            client: reqwest::Client::new(),
            max_retries: 5,
            base_delay: Duration::from_secs(2),
        })
    }

    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .context("GEMINI_API_KEY environment variable not set")?;
        let model = std::env::var("GEMINI_MODEL")
            .unwrap_or_else(|_| LLMConfig::default().model);

        Self::new(LLMConfig {
            api_key,
            model,
            ..Default::default()
        })
    }

    fn generate_jitter(&self) -> Duration {
        // Pseudo-random jitter from the clock; enough to spread retries.
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        Duration::from_millis(now.as_nanos() as u64 % 1000)
    }

    fn build_contents(turns: &[Turn]) -> Vec<serde_json::Value> {
        turns
            .iter()
            .map(|turn| match turn {
                Turn::User(text) => json!({
                    "role": "user",
                    "parts": [{ "text": text }]
                }),
                Turn::Assistant(text) => json!({
                    "role": "model",
                    "parts": [{ "text": text }]
                }),
                Turn::AssistantCall(call) => json!({
                    "role": "model",
                    "parts": [{ "functionCall": { "name": call.name, "args": call.args } }]
                }),
                Turn::ToolResult { name, value } => json!({
                    "role": "user",
                    "parts": [{ "functionResponse": { "name": name, "response": { "result": value } } }]
                }),
            })
            .collect()
    }

    async fn call_api(
        &self,
        system: &str,
        turns: &[Turn],
        tools: &[ToolSpec],
    ) -> Result<LLMResponse> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        debug!(model = %self.model, "calling Gemini API");

        let mut request_body = json!({
            "contents": Self::build_contents(turns),
            "systemInstruction": { "parts": [{ "text": system }] },
            "generationConfig": {
                "temperature": self.temperature,
                "topK": 40,
                "topP": 0.95,
            }
        });
        if !tools.is_empty() {
            let declarations: Vec<serde_json::Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    })
                })
                .collect();
            request_body["tools"] = json!([{ "functionDeclarations": declarations }]);
        }

        // Bounded exponential backoff with jitter on retryable failures.
        let mut attempt = 0;
        loop {
            let start_time = Instant::now();

            match self.perform_api_call(&url, &request_body).await {
                Ok(response) => {
                    info!(
                        attempt = attempt + 1,
                        took = ?start_time.elapsed(),
                        "Gemini API call successful"
                    );
                    return Ok(response);
                }
                Err(ApiError::Retryable(e)) if attempt < self.max_retries => {
                    attempt += 1;
                    let backoff_delay = self.base_delay * 2u32.pow(attempt - 1);
                    let total_delay = backoff_delay + self.generate_jitter();
                    warn!(
                        attempt,
                        max = self.max_retries,
                        delay = ?total_delay,
                        error = %e,
                        "Gemini API call failed, retrying"
                    );
                    sleep(total_delay).await;
                }
                Err(ApiError::Retryable(e)) | Err(ApiError::Fatal(e)) => return Err(e),
            }
        }
    }

    async fn perform_api_call(
        &self,
        url: &str,
        request_body: &serde_json::Value,
    ) -> std::result::Result<LLMResponse, ApiError> {
        let response = self
            .client
            .post(url)
            .json(request_body)
            .send()
            .await
            .context("Failed to send request to Gemini API")
            .map_err(ApiError::Retryable)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let err = anyhow::anyhow!("Gemini API error ({status}): {error_text}");
            // Rate limits and server errors are worth retrying; everything
            // else is a caller bug.
            return if status.as_u16() == 429 || status.is_server_error() {
                Err(ApiError::Retryable(err))
            } else {
                Err(ApiError::Fatal(err))
            };
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse Gemini API response")
            .map_err(ApiError::Fatal)?;

        Ok(parse_candidate(&response_json))
    }
}

enum ApiError {
    Retryable(anyhow::Error),
    Fatal(anyhow::Error),
}

/// Collect text and function-call parts of the first candidate.
fn parse_candidate(response: &serde_json::Value) -> LLMResponse {
    let mut out = LLMResponse::default();
    let parts = response["candidates"][0]["content"]["parts"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    for part in parts {
        if let Some(text) = part["text"].as_str() {
            out.content.push_str(text);
        }
        if let Some(call) = part.get("functionCall") {
            if let Some(name) = call["name"].as_str() {
                out.tool_calls.push(ToolCall {
                    name: name.to_string(),
                    args: call.get("args").cloned().unwrap_or(json!({})),
                });
            }
        }
    }
    out
}

#[async_trait]
impl LLMProvider for GeminiClient {
    async fn generate(
        &self,
        system: &str,
        turns: &[Turn],
        tools: &[ToolSpec],
    ) -> Result<LLMResponse> {
        self.call_api(system, turns, tools).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_parsing_splits_text_and_calls() {
        let response = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Looking that up. " },
                        { "functionCall": { "name": "get_component_details", "args": { "component_name": "Button" } } }
                    ]
                }
            }]
        });
        let parsed = parse_candidate(&response);
        assert_eq!(parsed.content, "Looking that up. ");
        assert_eq!(parsed.tool_calls.len(), 1);
        assert_eq!(parsed.tool_calls[0].name, "get_component_details");
        assert_eq!(parsed.tool_calls[0].args["component_name"], "Button");
    }

    #[test]
    fn tool_result_turns_become_function_responses() {
        let turns = vec![Turn::ToolResult {
            name: "search_components".into(),
            value: json!([{ "name": "Primary" }]),
        }];
        let contents = GeminiClient::build_contents(&turns);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(
            contents[0]["parts"][0]["functionResponse"]["name"],
            "search_components"
        );
    }

    #[tokio::test]
    #[ignore] // Requires API key
    async fn live_generate() {
        let client = GeminiClient::from_env().unwrap();
        let response = client
            .generate("You are terse.", &[Turn::User("Say hello!".into())], &[])
            .await;
        assert!(response.is_ok());
    }
}

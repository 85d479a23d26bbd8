//! OpenRouter chat-completions client
//!
//! Uses a long-lived reqwest::Client for connection pooling.
//! Also splits the model's reply into its prose summary and JSON draft.

use crate::config::LlmConfig;
use crate::error::PlannerError;
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

/// Bumped whenever the system prompt's output contract changes
pub const PROMPT_VERSION: u32 = 2;

const SYSTEM_PROMPT: &str = r#"You are an intelligent financial planning assistant.

First, provide a brief, user-friendly summary of the financial plan in plain English, highlighting key recommendations (monthly savings, investment, portfolio allocation, and goals). Then, return ONLY a valid JSON object in this format (no markdown):

{
  "monthly_savings": 0,
  "monthly_recommended_investment": 0,
  "portfolio_allocation": {
    "equity": 0,
    "debt": 0,
    "gold": 0,
    "emergency": 0
  },
  "goals": [
    {
      "name": "Goal Name",
      "target_amount": 0,
      "duration_years": 0
    }
  ]
}

If any field is missing or approximate, use reasonable estimates based on typical financial logic."#;

/// Reusable model client (connection-pooled)
pub struct OpenRouterClient {
    client: Client,
    config: LlmConfig,
}

impl OpenRouterClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self { client, config })
    }

    /// Send one user message and return the assistant's raw text
    pub async fn complete(&self, message: &str) -> Result<String> {
        if self.config.api_key.is_empty() {
            return Err(PlannerError::ConfigError(
                "OPENROUTER_API_KEY not configured".to_string(),
            ));
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: message,
                },
            ],
            max_tokens: self.config.max_tokens,
        };

        info!(model = %self.config.model, prompt_version = PROMPT_VERSION, "Calling model API");

        let response = self
            .client
            .post(&self.config.base_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Model API request failed: {}", e);
                PlannerError::LlmError(format!("Model API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Model API error response: {}", error_text);
            return Err(PlannerError::LlmError(format!(
                "Model API returned {}: {}",
                status, error_text
            )));
        }

        let completion: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse model response: {}", e);
            PlannerError::LlmError(format!("Model response parse error: {}", e))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| PlannerError::LlmError("No choices in model response".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

/// The model's reply, split into prose and structured draft
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub summary: String,
    pub draft: Option<Value>,
}

/// Everything before the first `{` is the summary; the rest, with any
/// markdown fences removed, must parse as JSON.
pub fn split_model_reply(reply: &str) -> Result<ModelReply> {
    let Some(json_start) = reply.find('{') else {
        return Ok(ModelReply {
            summary: reply.trim().to_string(),
            draft: None,
        });
    };

    let summary = strip_fences(&reply[..json_start]).trim().to_string();
    let json_text = strip_fences(&reply[json_start..]);

    let draft: Value = serde_json::from_str(json_text.trim()).map_err(|e| {
        PlannerError::LlmError(format!(
            "Model did not return a valid structured plan: {}",
            e
        ))
    })?;

    Ok(ModelReply {
        summary,
        draft: Some(draft),
    })
}

/// Remove ``` and ```json style fence markers
fn strip_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .map(|line| {
            let trimmed = line.trim_end();
            trimmed.strip_suffix("```").unwrap_or(trimmed)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "meta-llama/llama-3-70b-instruct",
            messages: vec![ChatMessage {
                role: "user",
                content: "Plan my savings",
            }],
            max_tokens: 700,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["max_tokens"], json!(700));
        assert_eq!(json["messages"][0]["content"], json!("Plan my savings"));
    }

    #[test]
    fn test_split_summary_and_plan() {
        let reply = "Save more and invest monthly.\n{\"monthly_savings\": 10000}";
        let split = split_model_reply(reply).unwrap();
        assert_eq!(split.summary, "Save more and invest monthly.");
        assert_eq!(split.draft, Some(json!({ "monthly_savings": 10000 })));
    }

    #[test]
    fn test_split_strips_fences() {
        let reply = "Here is your plan:\n```json\n{\"goals\": []}\n```";
        let split = split_model_reply(reply).unwrap();
        assert_eq!(split.summary, "Here is your plan:");
        assert_eq!(split.draft, Some(json!({ "goals": [] })));
    }

    #[test]
    fn test_summary_only_reply() {
        let split = split_model_reply("  I need more details about your income.  ").unwrap();
        assert_eq!(split.summary, "I need more details about your income.");
        assert!(split.draft.is_none());
    }

    #[test]
    fn test_invalid_json_is_llm_error() {
        let result = split_model_reply("Summary {not json");
        assert!(matches!(result, Err(PlannerError::LlmError(_))));
    }

    #[test]
    fn test_response_deserialization() {
        let body = json!({
            "id": "gen-1",
            "choices": [{ "message": { "role": "assistant", "content": "hello" } }]
        });
        let parsed: ChatResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hello");
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let client = OpenRouterClient::new(LlmConfig::default()).unwrap();
        let result = client.complete("hi").await;
        assert!(matches!(result, Err(PlannerError::ConfigError(_))));
    }
}

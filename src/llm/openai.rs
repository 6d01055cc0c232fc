//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::ModelConfig;
use crate::error::LlmError;
use crate::llm::{ChatMessage, ModelClient, retry::with_retries};

/// Chat completions client for any OpenAI-compatible endpoint.
pub struct OpenAiClient {
    config: ModelConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: ModelConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { config, http }
    }

    async fn request_once(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let body = serde_json::json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": messages,
        });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        timeout: self.config.timeout,
                    }
                } else {
                    LlmError::RequestFailed {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            // 5xx and 429 are worth retrying; 4xx means the request itself
            // is wrong and a repeat would fail identically.
            if status.is_server_error() || status.as_u16() == 429 {
                return Err(LlmError::RequestFailed {
                    reason: format!("{status}: {text}"),
                });
            }
            return Err(LlmError::InvalidResponse {
                reason: format!("{status}: {text}"),
            });
        }

        let parsed: CompletionResponse =
            resp.json().await.map_err(|e| LlmError::InvalidResponse {
                reason: format!("malformed completion body: {e}"),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse {
                reason: "no choices in completion".into(),
            })
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        with_retries(self.config.max_retries, || self.request_once(messages)).await
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use std::time::Duration;

    fn config() -> ModelConfig {
        ModelConfig {
            model: "gpt-4o-mini".into(),
            api_base: "https://api.openai.com/v1/".into(),
            api_key: SecretString::from("sk-test"),
            temperature: 0.5,
            max_retries: 3,
            timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn client_constructs_and_reports_model() {
        let client = OpenAiClient::new(config());
        assert_eq!(client.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn completion_body_deserializes() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hello"));
    }

    #[test]
    fn completion_body_tolerates_null_content() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}

//! Web content fetch tool: GET a page and return its readable text.
//!
//! This is the agent's reference lookup: the business info website goes
//! into the prompt and the model fetches pages from it when it needs
//! details to answer a customer.

use std::time::Duration;

use async_trait::async_trait;

use crate::email::normalize::strip_html;
use crate::error::ToolError;
use crate::tools::Tool;

/// Maximum characters of page text returned as an observation.
const MAX_OBSERVATION_CHARS: usize = 8_000;

/// Per-fetch timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Fetches a URL and returns its text content.
pub struct WebFetchTool {
    client: reqwest::Client,
}

impl WebFetchTool {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for WebFetchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebFetchTool {
    fn name(&self) -> &str {
        "web_fetch"
    }

    fn description(&self) -> &str {
        "Fetch a web page by URL and return its readable text. \
         Input must be a single http or https URL."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let url = input.trim().trim_matches('"');
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::InvalidInput {
                name: self.name().to_string(),
                reason: format!("not an http(s) URL: {url:?}"),
            });
        }

        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ToolError::Timeout {
                    name: self.name().to_string(),
                    timeout: FETCH_TIMEOUT,
                }
            } else {
                ToolError::ExecutionFailed {
                    name: self.name().to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ToolError::ExecutionFailed {
                name: self.name().to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        let html = resp.text().await.map_err(|e| ToolError::ExecutionFailed {
            name: self.name().to_string(),
            reason: format!("failed to read body: {e}"),
        })?;

        let mut text = strip_html(&html);
        if text.chars().count() > MAX_OBSERVATION_CHARS {
            let cut = text
                .char_indices()
                .nth(MAX_OBSERVATION_CHARS)
                .map(|(i, _)| i)
                .unwrap_or(text.len());
            text.truncate(cut);
            text.push_str("...");
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_http_input() {
        let tool = WebFetchTool::new();
        let err = tool.invoke("ftp://example.com").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn rejects_plain_text_input() {
        let tool = WebFetchTool::new();
        assert!(tool.invoke("what is the url?").await.is_err());
    }

    #[tokio::test]
    async fn strips_surrounding_quotes_before_validating() {
        let tool = WebFetchTool::new();
        // Quoted non-URL still fails as InvalidInput, not as a fetch attempt
        // on a quote-prefixed string.
        let err = tool.invoke("\"not a url\"").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }

    #[test]
    fn tool_identity() {
        let tool = WebFetchTool::new();
        assert_eq!(tool.name(), "web_fetch");
        assert!(tool.description().contains("URL"));
    }
}

//! Anthropic Claude completion adapter.

use serde::Deserialize;

use super::{CompletionBackend, CompletionRequest, http_client};
use crate::config::CompletionProvider;
use crate::error::ProviderError;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const MAX_TOKENS: u32 = 4096;

/// Claude provider adapter
#[derive(Debug, Default, Clone)]
pub struct ClaudeProvider;

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

impl CompletionBackend for ClaudeProvider {
    fn name(&self) -> &'static str {
        "claude"
    }

    fn kind(&self) -> CompletionProvider {
        CompletionProvider::Claude
    }

    fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError> {
        let model = request.model.as_deref().unwrap_or(DEFAULT_MODEL);

        let payload = serde_json::json!({
            "model": model,
            "max_tokens": MAX_TOKENS,
            "system": request.system,
            "messages": [
                {"role": "user", "content": request.user}
            ],
            "temperature": request.temperature,
        });

        let response = http_client()?
            .post(MESSAGES_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_else(|_| "unknown error".to_string());
            return Err(ProviderError::from_status(status, body));
        }

        let body = response.text()?;
        let parsed: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::transient(format!("Failed to parse Claude response: {e}"))
        })?;

        parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| ProviderError::empty_result("No content in Claude response"))
    }
}

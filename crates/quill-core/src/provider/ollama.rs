//! Ollama completion adapter for local LLMs.
//!
//! The credential slot carries the server URL instead of an API key; no
//! authentication is required.

use serde::Deserialize;

use super::{CompletionBackend, CompletionRequest, http_client};
use crate::config::CompletionProvider;
use crate::error::ProviderError;

/// Default Ollama server URL
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

const DEFAULT_MODEL: &str = "llama3.2";

/// Ollama provider adapter
#[derive(Debug, Default, Clone)]
pub struct OllamaProvider;

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl CompletionBackend for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn kind(&self) -> CompletionProvider {
        CompletionProvider::Ollama
    }

    fn complete(
        &self,
        server_url: &str,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError> {
        let base_url = if server_url.is_empty() {
            DEFAULT_OLLAMA_URL
        } else {
            server_url
        };
        let url = format!("{}/api/chat", base_url.trim_end_matches('/'));

        let payload = serde_json::json!({
            "model": request.model.as_deref().unwrap_or(DEFAULT_MODEL),
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user}
            ],
            "options": {"temperature": request.temperature},
            "stream": false,
        });

        let response = http_client()?.post(&url).json(&payload).send().map_err(|e| {
            if e.is_connect() {
                ProviderError::transient(format!(
                    "Cannot connect to Ollama at {base_url}. Is Ollama running? Start with: ollama serve"
                ))
            } else {
                ProviderError::from(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_else(|_| "unknown error".to_string());
            return Err(ProviderError::from_status(status, body));
        }

        let body = response.text()?;
        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::transient(format!("Failed to parse Ollama response: {e}"))
        })?;

        Ok(parsed.message.content.trim().to_string())
    }
}

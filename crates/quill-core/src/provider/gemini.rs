//! Google Gemini completion adapter.
//!
//! Gemini has no separate system role on this endpoint; the system
//! instruction is sent as the first part of the user turn.

use serde::Deserialize;

use super::{CompletionBackend, CompletionRequest, http_client};
use crate::config::CompletionProvider;
use crate::error::ProviderError;

const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini provider adapter
#[derive(Debug, Default, Clone)]
pub struct GeminiProvider;

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: String,
}

impl CompletionBackend for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn kind(&self) -> CompletionProvider {
        CompletionProvider::Gemini
    }

    fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError> {
        let model = request.model.as_deref().unwrap_or(DEFAULT_MODEL);
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent?key={api_key}"
        );

        let payload = serde_json::json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [
                        {"text": request.system},
                        {"text": request.user}
                    ]
                }
            ],
            "generationConfig": {
                "temperature": request.temperature,
            }
        });

        let response = http_client()?.post(&url).json(&payload).send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_else(|_| "unknown error".to_string());
            return Err(ProviderError::from_status(status, body));
        }

        let body = response.text()?;
        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::transient(format!("Failed to parse Gemini response: {e}"))
        })?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| ProviderError::empty_result("No candidates in Gemini response"))
    }
}

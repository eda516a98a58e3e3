//! Deepgram transcription adapter.
//!
//! Deepgram takes the raw audio body directly (no multipart) and
//! authenticates with a `Token` header rather than a bearer token.

use serde::Deserialize;

use super::{TranscriptionBackend, TranscriptionRequest, http_client};
use crate::config::TranscriptionProvider;
use crate::error::ProviderError;

const LISTEN_URL: &str = "https://api.deepgram.com/v1/listen";
const DEFAULT_MODEL: &str = "nova-2";

/// Deepgram provider adapter
#[derive(Debug, Default, Clone)]
pub struct DeepgramProvider;

#[derive(Deserialize)]
struct ListenResponse {
    results: ListenResults,
}

#[derive(Deserialize)]
struct ListenResults {
    channels: Vec<Channel>,
}

#[derive(Deserialize)]
struct Channel {
    alternatives: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    transcript: String,
}

impl TranscriptionBackend for DeepgramProvider {
    fn name(&self) -> &'static str {
        "deepgram"
    }

    fn kind(&self) -> TranscriptionProvider {
        TranscriptionProvider::Deepgram
    }

    fn transcribe(
        &self,
        api_key: &str,
        request: &TranscriptionRequest,
    ) -> Result<String, ProviderError> {
        let model = request.model.as_deref().unwrap_or(DEFAULT_MODEL);

        let mut query: Vec<(&str, String)> = vec![
            ("model", model.to_string()),
            ("smart_format", "true".to_string()),
            ("punctuate", "true".to_string()),
        ];
        if let Some(lang) = request.language.clone() {
            query.push(("language", lang));
        }

        let response = http_client()?
            .post(LISTEN_URL)
            .header("Authorization", format!("Token {api_key}"))
            .header("Content-Type", request.mime_type.clone())
            .query(&query)
            .body(request.audio_data.clone())
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_else(|_| "unknown error".to_string());
            return Err(ProviderError::from_status(status, body));
        }

        let body = response.text()?;
        let parsed: ListenResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::transient(format!("Failed to parse Deepgram response: {e}"))
        })?;

        parsed
            .results
            .channels
            .into_iter()
            .next()
            .and_then(|channel| channel.alternatives.into_iter().next())
            .map(|alternative| alternative.transcript)
            .ok_or_else(|| ProviderError::empty_result("No transcript in Deepgram response"))
    }
}

//! Shared implementation for OpenAI-compatible APIs.
//!
//! Both OpenAI and Groq expose the same Whisper-style transcription endpoint
//! (multipart form upload with `model` and `file` fields, bearer-token auth,
//! JSON response with a `text` field) and the same chat-completions endpoint.
//! The concrete adapters only differ in base URL and default model names.

use serde::Deserialize;

use super::super::{CompletionRequest, TranscriptionRequest, http_client};
use crate::error::ProviderError;

/// Response structure for OpenAI-compatible transcription APIs
#[derive(Deserialize)]
struct TranscribeResponse {
    text: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

/// Transcribe audio through an OpenAI-compatible endpoint.
pub(crate) fn openai_compatible_transcribe(
    api_url: &str,
    model: &str,
    api_key: &str,
    request: &TranscriptionRequest,
) -> Result<String, ProviderError> {
    let mut form = reqwest::blocking::multipart::Form::new()
        .text("model", model.to_string())
        .part(
            "file",
            reqwest::blocking::multipart::Part::bytes(request.audio_data.clone())
                .file_name(request.filename.clone())
                .mime_str(&request.mime_type)?,
        );

    if let Some(lang) = request.language.clone() {
        form = form.text("language", lang);
    }

    let response = http_client()?
        .post(api_url)
        .header("Authorization", format!("Bearer {api_key}"))
        .multipart(form)
        .send()?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().unwrap_or_else(|_| "unknown error".to_string());
        return Err(ProviderError::from_status(status, body));
    }

    let body = response.text()?;
    let parsed: TranscribeResponse = serde_json::from_str(&body)
        .map_err(|e| ProviderError::transient(format!("Failed to parse API response: {e}")))?;

    Ok(parsed.text)
}

/// Run a chat completion through an OpenAI-compatible endpoint.
///
/// When the request asks for a structured response, the fixed single-field
/// transcript schema is attached as a `json_schema` response format; the
/// returned value is still the raw message content, parsed downstream.
pub(crate) fn openai_compatible_complete(
    api_url: &str,
    model: &str,
    api_key: &str,
    request: &CompletionRequest,
) -> Result<String, ProviderError> {
    let mut payload = serde_json::json!({
        "model": model,
        "messages": [
            {"role": "system", "content": request.system},
            {"role": "user", "content": request.user}
        ],
        "temperature": request.temperature,
    });

    if request.structured {
        payload["response_format"] = serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": "processed_transcript",
                "strict": true,
                "schema": {
                    "type": "object",
                    "properties": {
                        "processed_and_cleaned_transcript": {"type": "string"}
                    },
                    "required": ["processed_and_cleaned_transcript"],
                    "additionalProperties": false
                }
            }
        });
    }

    let response = http_client()?
        .post(api_url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&payload)
        .send()?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().unwrap_or_else(|_| "unknown error".to_string());
        return Err(ProviderError::from_status(status, body));
    }

    let body = response.text()?;
    let parsed: ChatResponse = serde_json::from_str(&body)
        .map_err(|e| ProviderError::transient(format!("Failed to parse chat response: {e}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::empty_result("No choices in chat response"))
}

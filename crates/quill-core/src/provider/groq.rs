//! Groq adapter: Whisper transcription and chat-completion post-processing.
//!
//! Groq mirrors the OpenAI API surface under its own base URL.

use super::base::{openai_compatible_complete, openai_compatible_transcribe};
use super::{CompletionBackend, CompletionRequest, TranscriptionBackend, TranscriptionRequest};
use crate::config::{CompletionProvider, TranscriptionProvider};
use crate::error::ProviderError;

const TRANSCRIBE_URL: &str = "https://api.groq.com/openai/v1/audio/transcriptions";
const CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

const DEFAULT_TRANSCRIBE_MODEL: &str = "whisper-large-v3";
const DEFAULT_CHAT_MODEL: &str = "llama-3.1-8b-instant";

/// Groq provider adapter
#[derive(Debug, Default, Clone)]
pub struct GroqProvider;

impl TranscriptionBackend for GroqProvider {
    fn name(&self) -> &'static str {
        "groq"
    }

    fn kind(&self) -> TranscriptionProvider {
        TranscriptionProvider::Groq
    }

    fn transcribe(
        &self,
        api_key: &str,
        request: &TranscriptionRequest,
    ) -> Result<String, ProviderError> {
        let model = request.model.as_deref().unwrap_or(DEFAULT_TRANSCRIBE_MODEL);
        openai_compatible_transcribe(TRANSCRIBE_URL, model, api_key, request)
    }
}

impl CompletionBackend for GroqProvider {
    fn name(&self) -> &'static str {
        "groq"
    }

    fn kind(&self) -> CompletionProvider {
        CompletionProvider::Groq
    }

    fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError> {
        let model = request.model.as_deref().unwrap_or(DEFAULT_CHAT_MODEL);
        openai_compatible_complete(CHAT_URL, model, api_key, request)
    }
}

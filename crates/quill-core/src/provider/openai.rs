//! OpenAI adapter: Whisper transcription and chat-completion post-processing.

use super::base::{openai_compatible_complete, openai_compatible_transcribe};
use super::{CompletionBackend, CompletionRequest, TranscriptionBackend, TranscriptionRequest};
use crate::config::{CompletionProvider, TranscriptionProvider};
use crate::error::ProviderError;

const TRANSCRIBE_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

const DEFAULT_TRANSCRIBE_MODEL: &str = "whisper-1";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// OpenAI provider adapter
#[derive(Debug, Default, Clone)]
pub struct OpenAiProvider;

impl TranscriptionBackend for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn kind(&self) -> TranscriptionProvider {
        TranscriptionProvider::OpenAI
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

impl CompletionBackend for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn kind(&self) -> CompletionProvider {
        CompletionProvider::OpenAI
    }

    fn supports_structured(&self) -> bool {
        true
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

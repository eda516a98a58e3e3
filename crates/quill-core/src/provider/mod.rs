//! Provider adapters for transcription and LLM completion backends.
//!
//! Adapters are stateless: every call carries its own credential and request,
//! and nothing is cached between calls except the shared HTTP client. The
//! closed set of adapters is registered once in a static registry and looked
//! up through the typed [`TranscriptionProvider`] / [`CompletionProvider`]
//! enums — there is no string-keyed dispatch.

mod base;
mod claude;
mod deepgram;
mod gemini;
mod groq;
#[cfg(feature = "local-transcription")]
mod local_whisper;
mod ollama;
mod openai;

use anyhow::Result;
use once_cell::sync::{Lazy, OnceCell};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{CompletionProvider, TranscriptionProvider};
use crate::error::ProviderError;

pub use claude::ClaudeProvider;
pub use deepgram::DeepgramProvider;
pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
#[cfg(feature = "local-transcription")]
pub use local_whisper::LocalWhisperProvider;
pub use ollama::{DEFAULT_OLLAMA_URL, OllamaProvider};
pub use openai::OpenAiProvider;

/// Request timeout for provider calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// One audio payload ready for a transcription call.
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    /// Encoded audio (WAV) ready for upload.
    pub audio_data: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
    /// Optional language hint.
    pub language: Option<String>,
    /// Model override; adapters fall back to their provider default.
    pub model: Option<String>,
}

/// One prompt pair ready for a completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    /// Model override; adapters fall back to their provider default.
    pub model: Option<String>,
    pub temperature: f32,
    /// Ask for the fixed single-field transcript schema. Only honored by
    /// adapters that report structured-response support.
    pub structured: bool,
}

/// A speech-to-text backend.
///
/// `credential` is the API key for cloud providers and the model path for
/// the local provider.
pub trait TranscriptionBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> TranscriptionProvider;

    fn transcribe(
        &self,
        credential: &str,
        request: &TranscriptionRequest,
    ) -> Result<String, ProviderError>;
}

/// A chat-completion backend used by the text-transform pipeline.
///
/// `credential` is the API key for cloud providers and the server URL for
/// Ollama.
pub trait CompletionBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> CompletionProvider;

    /// Whether this adapter can honor a structured-response request.
    fn supports_structured(&self) -> bool {
        false
    }

    fn complete(
        &self,
        credential: &str,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError>;
}

/// Static registry over the closed set of provider adapters.
pub struct ProviderRegistry {
    transcribers: Vec<Arc<dyn TranscriptionBackend>>,
    completers: Vec<Arc<dyn CompletionBackend>>,
}

impl ProviderRegistry {
    fn new() -> Self {
        let transcribers: Vec<Arc<dyn TranscriptionBackend>> = vec![
            Arc::new(OpenAiProvider),
            Arc::new(GroqProvider),
            Arc::new(DeepgramProvider),
            #[cfg(feature = "local-transcription")]
            Arc::new(LocalWhisperProvider),
        ];
        let completers: Vec<Arc<dyn CompletionBackend>> = vec![
            Arc::new(OpenAiProvider),
            Arc::new(GroqProvider),
            Arc::new(ClaudeProvider),
            Arc::new(GeminiProvider),
            Arc::new(OllamaProvider),
        ];
        Self {
            transcribers,
            completers,
        }
    }

    /// Typed lookup of a transcription adapter.
    pub fn transcriber(
        &self,
        kind: &TranscriptionProvider,
    ) -> Result<Arc<dyn TranscriptionBackend>> {
        self.transcribers
            .iter()
            .find(|backend| backend.kind() == *kind)
            .cloned()
            .ok_or_else(|| match kind {
                TranscriptionProvider::LocalWhisper => anyhow::anyhow!(
                    "quill was built without the local-transcription feature"
                ),
                other => anyhow::anyhow!("No transcription adapter registered for {other}"),
            })
    }

    /// Typed lookup of a completion adapter.
    pub fn completer(&self, kind: &CompletionProvider) -> Result<Arc<dyn CompletionBackend>> {
        self.completers
            .iter()
            .find(|backend| backend.kind() == *kind)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No completion adapter registered for {kind}"))
    }
}

static REGISTRY: Lazy<ProviderRegistry> = Lazy::new(ProviderRegistry::new);

/// The process-wide adapter registry.
pub fn registry() -> &'static ProviderRegistry {
    &REGISTRY
}

static HTTP_CLIENT: OnceCell<reqwest::blocking::Client> = OnceCell::new();

/// Shared blocking HTTP client with the default provider timeout.
pub(crate) fn http_client() -> Result<&'static reqwest::blocking::Client, ProviderError> {
    HTTP_CLIENT.get_or_try_init(|| {
        reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::transient(format!("Failed to build HTTP client: {e}")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_resolves_cloud_transcribers() {
        for kind in [
            TranscriptionProvider::OpenAI,
            TranscriptionProvider::Groq,
            TranscriptionProvider::Deepgram,
        ] {
            let backend = registry().transcriber(&kind).unwrap();
            assert_eq!(backend.kind(), kind);
        }
    }

    #[test]
    fn test_registry_resolves_all_completers() {
        for kind in CompletionProvider::all() {
            let backend = registry().completer(kind).unwrap();
            assert_eq!(&backend.kind(), kind);
        }
    }

    #[cfg(not(feature = "local-transcription"))]
    #[test]
    fn test_local_whisper_unavailable_without_feature() {
        assert!(registry()
            .transcriber(&TranscriptionProvider::LocalWhisper)
            .is_err());
    }
}

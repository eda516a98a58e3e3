//! Retry/fallback loop over the configured transcription adapters.
//!
//! The executor consumes an immutable capture buffer and an ordered adapter
//! list (primary first, then fallbacks) and produces either a transcription
//! or an exhaustion error carrying the complete attempt history. It runs on
//! the session engine's worker thread; provider calls are blocking there.
//!
//! Retry policy:
//! - an empty or all-whitespace result is a soft failure, never a success
//! - `transient` errors retry the same adapter after a backoff delay, or
//!   rotate to the next configured adapter when fallbacks exist
//! - `auth` and `empty_result` never re-try the same adapter immediately and
//!   advance to the next configured one
//!
//! Rotation is modular over the configured list: with a single adapter the
//! "next" adapter is that adapter again. The global attempt budget
//! (`max_retries`), not per-adapter bookkeeping, bounds the loop.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::audio::{AudioBuffer, encode_wav_i16};
use crate::config::TranscriptionProvider;
use crate::error::{ExhaustedError, ProviderErrorKind};
use crate::provider::{TranscriptionBackend, TranscriptionRequest};

/// How a single attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    /// Completed without a transport error but yielded unusable text.
    SoftFailure,
    Error,
}

/// One entry of the append-only attempt history.
#[derive(Debug, Clone)]
pub struct TranscriptionAttempt {
    pub index: usize,
    pub provider: TranscriptionProvider,
    pub model: String,
    pub timestamp: DateTime<Utc>,
    pub outcome: AttemptOutcome,
    pub error_kind: Option<ProviderErrorKind>,
    pub latency: Duration,
}

/// Successful transcription with its attempt history.
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    pub raw_text: String,
    pub text: String,
    pub attempts: Vec<TranscriptionAttempt>,
}

/// An adapter resolved from the registry together with its credential.
#[derive(Clone)]
pub struct ConfiguredAdapter {
    pub backend: Arc<dyn TranscriptionBackend>,
    /// API key, model path or server URL depending on the adapter.
    pub credential: String,
    pub model: Option<String>,
}

/// Executor tuning captured in the session config snapshot.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub max_retries: usize,
    pub backoff: Duration,
    pub language: Option<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_secs(1),
            language: None,
        }
    }
}

/// Run the retry/fallback loop until success or exhaustion.
///
/// The caller guarantees the buffer meets the minimum-duration invariant;
/// buffers below it must never reach this function.
pub fn execute(
    buffer: &AudioBuffer,
    adapters: &[ConfiguredAdapter],
    config: &ExecutorConfig,
) -> Result<TranscriptionResult, ExhaustedError> {
    let mut attempts: Vec<TranscriptionAttempt> = Vec::new();

    if adapters.is_empty() {
        return Err(ExhaustedError { attempts });
    }

    let audio_data = match encode_wav_i16(buffer.samples(), buffer.sample_rate()) {
        Ok(data) => data,
        Err(e) => {
            crate::verbose!("Failed to encode capture buffer for upload: {e}");
            return Err(ExhaustedError { attempts });
        }
    };

    let mut adapter_idx = 0;

    for index in 0..config.max_retries {
        let adapter = &adapters[adapter_idx % adapters.len()];
        let model = adapter
            .model
            .clone()
            .unwrap_or_else(|| "default".to_string());

        let request = TranscriptionRequest {
            audio_data: audio_data.clone(),
            filename: "audio.wav".to_string(),
            mime_type: "audio/wav".to_string(),
            language: config.language.clone(),
            model: adapter.model.clone(),
        };

        let timestamp = Utc::now();
        let started = Instant::now();
        let outcome = adapter.backend.transcribe(&adapter.credential, &request);
        let latency = started.elapsed();

        match outcome {
            Ok(text) if !text.trim().is_empty() => {
                attempts.push(TranscriptionAttempt {
                    index,
                    provider: adapter.backend.kind(),
                    model,
                    timestamp,
                    outcome: AttemptOutcome::Success,
                    error_kind: None,
                    latency,
                });
                crate::verbose!(
                    "Transcription succeeded on attempt {} via {} in {:.2}s",
                    index + 1,
                    adapter.backend.name(),
                    latency.as_secs_f64()
                );
                let normalized = text.trim().to_string();
                return Ok(TranscriptionResult {
                    raw_text: text,
                    text: normalized,
                    attempts,
                });
            }
            Ok(_) => {
                // Soft failure: the provider answered but gave us nothing.
                attempts.push(TranscriptionAttempt {
                    index,
                    provider: adapter.backend.kind(),
                    model,
                    timestamp,
                    outcome: AttemptOutcome::SoftFailure,
                    error_kind: Some(ProviderErrorKind::EmptyResult),
                    latency,
                });
                crate::verbose!(
                    "Transcription attempt {} via {} returned empty text",
                    index + 1,
                    adapter.backend.name()
                );
                adapter_idx += 1;
            }
            Err(err) => {
                attempts.push(TranscriptionAttempt {
                    index,
                    provider: adapter.backend.kind(),
                    model,
                    timestamp,
                    outcome: AttemptOutcome::Error,
                    error_kind: Some(err.kind),
                    latency,
                });
                crate::verbose!(
                    "Transcription attempt {} via {} failed: {err}",
                    index + 1,
                    adapter.backend.name()
                );
                match err.kind {
                    ProviderErrorKind::Transient => {
                        if adapters.len() > 1 {
                            adapter_idx += 1;
                        } else if index + 1 < config.max_retries {
                            std::thread::sleep(config.backoff);
                        }
                    }
                    ProviderErrorKind::Auth | ProviderErrorKind::EmptyResult => {
                        adapter_idx += 1;
                    }
                }
            }
        }
    }

    Err(ExhaustedError { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::EnergyVad;
    use crate::error::ProviderError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedBackend {
        kind: TranscriptionProvider,
        responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    }

    impl ScriptedBackend {
        fn new(
            kind: TranscriptionProvider,
            responses: Vec<Result<String, ProviderError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                kind,
                responses: Mutex::new(responses.into()),
            })
        }
    }

    impl TranscriptionBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn kind(&self) -> TranscriptionProvider {
            self.kind.clone()
        }

        fn transcribe(
            &self,
            _credential: &str,
            _request: &TranscriptionRequest,
        ) -> Result<String, ProviderError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::transient("script exhausted")))
        }
    }

    fn adapter(backend: Arc<ScriptedBackend>) -> ConfiguredAdapter {
        ConfiguredAdapter {
            backend,
            credential: "test-key".to_string(),
            model: None,
        }
    }

    fn test_buffer() -> AudioBuffer {
        let mut buffer = AudioBuffer::new(16000, 1, EnergyVad::new(0.01));
        buffer.push_samples(&vec![0.1f32; 16000]);
        buffer
    }

    fn fast_config(max_retries: usize) -> ExecutorConfig {
        ExecutorConfig {
            max_retries,
            backoff: Duration::ZERO,
            language: None,
        }
    }

    #[test]
    fn test_success_on_first_attempt() {
        let backend = ScriptedBackend::new(
            TranscriptionProvider::OpenAI,
            vec![Ok("  hello world  ".to_string())],
        );
        let result = execute(&test_buffer(), &[adapter(backend)], &fast_config(3)).unwrap();
        assert_eq!(result.text, "hello world");
        assert_eq!(result.raw_text, "  hello world  ");
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(result.attempts[0].outcome, AttemptOutcome::Success);
    }

    #[test]
    fn test_empty_results_exhaust_as_soft_failures() {
        let backend = ScriptedBackend::new(
            TranscriptionProvider::OpenAI,
            vec![
                Ok(String::new()),
                Ok("   ".to_string()),
                Ok(String::new()),
            ],
        );
        let err = execute(&test_buffer(), &[adapter(backend)], &fast_config(3)).unwrap_err();
        assert_eq!(err.attempts.len(), 3);
        for attempt in &err.attempts {
            assert_eq!(attempt.outcome, AttemptOutcome::SoftFailure);
            assert_eq!(attempt.error_kind, Some(ProviderErrorKind::EmptyResult));
        }
    }

    #[test]
    fn test_transient_retries_same_adapter() {
        let backend = ScriptedBackend::new(
            TranscriptionProvider::Groq,
            vec![
                Err(ProviderError::transient("connection reset")),
                Ok("recovered".to_string()),
            ],
        );
        let result = execute(&test_buffer(), &[adapter(backend)], &fast_config(3)).unwrap();
        assert_eq!(result.text, "recovered");
        assert_eq!(result.attempts.len(), 2);
        assert_eq!(result.attempts[0].error_kind, Some(ProviderErrorKind::Transient));
        assert_eq!(result.attempts[1].provider, TranscriptionProvider::Groq);
    }

    #[test]
    fn test_auth_failure_rotates_to_fallback() {
        let primary = ScriptedBackend::new(
            TranscriptionProvider::OpenAI,
            vec![Err(ProviderError::auth("invalid key"))],
        );
        let fallback = ScriptedBackend::new(
            TranscriptionProvider::Deepgram,
            vec![Ok("from fallback".to_string())],
        );
        let adapters = vec![adapter(primary), adapter(fallback)];
        let result = execute(&test_buffer(), &adapters, &fast_config(3)).unwrap();
        assert_eq!(result.text, "from fallback");
        assert_eq!(result.attempts.len(), 2);
        assert_eq!(result.attempts[0].provider, TranscriptionProvider::OpenAI);
        assert_eq!(result.attempts[1].provider, TranscriptionProvider::Deepgram);
    }

    #[test]
    fn test_transient_rotates_when_fallback_exists() {
        let primary = ScriptedBackend::new(
            TranscriptionProvider::OpenAI,
            vec![Err(ProviderError::transient("timeout"))],
        );
        let fallback = ScriptedBackend::new(
            TranscriptionProvider::Groq,
            vec![Ok("fallback text".to_string())],
        );
        let adapters = vec![adapter(primary), adapter(fallback)];
        let result = execute(&test_buffer(), &adapters, &fast_config(2)).unwrap();
        assert_eq!(result.attempts[1].provider, TranscriptionProvider::Groq);
    }

    #[test]
    fn test_attempt_count_never_exceeds_max_retries() {
        let backend = ScriptedBackend::new(
            TranscriptionProvider::OpenAI,
            vec![
                Err(ProviderError::transient("boom")),
                Err(ProviderError::transient("boom")),
                Err(ProviderError::transient("boom")),
                Err(ProviderError::transient("boom")),
                Err(ProviderError::transient("boom")),
            ],
        );
        let err = execute(&test_buffer(), &[adapter(backend)], &fast_config(4)).unwrap_err();
        assert_eq!(err.attempts.len(), 4);
        let indexes: Vec<usize> = err.attempts.iter().map(|a| a.index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_no_adapters_is_immediate_exhaustion() {
        let err = execute(&test_buffer(), &[], &fast_config(3)).unwrap_err();
        assert!(err.attempts.is_empty());
    }
}

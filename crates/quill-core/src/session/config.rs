//! Immutable per-session configuration snapshot.
//!
//! Captured from live [`Settings`] when the engine starts. Concurrent
//! settings edits cannot race an in-progress session: the engine only ever
//! reads this snapshot. Provider adapters and credentials are resolved here,
//! up front, so a misconfigured session fails before any capture starts.

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::TranscriptionProvider;
use crate::provider::registry;
use crate::rewrite::{FindReplaceRule, RewriteOptions, load_rules};
use crate::session::{RecordingMode, SessionController};
use crate::settings::{KeySettings, Settings};
use crate::transcription::{ConfiguredAdapter, ExecutorConfig, LlmMode, PostProcessConfig};

/// What an activation combo asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationKind {
    /// Record and type the transcript as-is
    Plain,
    /// Record, then LLM cleanup
    LlmCleanup,
    /// Record, then treat the transcript as an LLM instruction
    LlmInstruction,
    /// Clean supplied text without recording
    TextCleanup,
}

impl ActivationKind {
    /// The post-processing mode this activation implies, if any.
    pub fn llm_mode(&self) -> Option<LlmMode> {
        match self {
            ActivationKind::Plain => None,
            ActivationKind::LlmCleanup => Some(LlmMode::Cleanup),
            ActivationKind::LlmInstruction => Some(LlmMode::Instruction),
            ActivationKind::TextCleanup => Some(LlmMode::ClipboardCleanup),
        }
    }
}

/// Everything one engine needs, frozen at start.
pub struct SessionConfig {
    /// Effective recording mode after the continuous-mode guard.
    pub mode: RecordingMode,
    /// Set when the guard refused the requested mode.
    pub config_error: Option<String>,

    pub min_duration: Duration,
    pub silence_stop: Duration,
    pub continuous_timeout: Duration,
    pub silence_threshold: f32,
    pub sound_device: Option<String>,

    /// Primary adapter first, then fallbacks, in configured order.
    pub adapters: Vec<ConfiguredAdapter>,
    pub executor: ExecutorConfig,

    pub rules: Vec<FindReplaceRule>,
    pub rewrite_options: RewriteOptions,
    pub post_processing: Option<PostProcessConfig>,

    pub clipboard_threshold: usize,
    pub data_root: PathBuf,
    pub keys: KeySettings,
}

impl SessionConfig {
    /// Capture an immutable snapshot from live settings.
    ///
    /// Fails when a configured provider has no resolvable credential; a
    /// session must not start capture it cannot transcribe.
    pub fn snapshot(settings: &Settings) -> Result<Self> {
        let mut adapters = Vec::new();
        let mut kinds: Vec<TranscriptionProvider> =
            vec![settings.transcription.provider.clone()];
        for fallback in &settings.transcription.fallbacks {
            if !kinds.contains(fallback) {
                kinds.push(fallback.clone());
            }
        }

        for kind in &kinds {
            let backend = registry().transcriber(kind)?;
            let credential = settings
                .transcription
                .credential_for(kind)
                .with_context(|| {
                    format!(
                        "No {} configured for {}. Set it with: quill config",
                        if kind.requires_api_key() {
                            "API key"
                        } else {
                            "model path"
                        },
                        kind.display_name()
                    )
                })?;
            adapters.push(ConfiguredAdapter {
                backend,
                credential,
                model: settings.transcription.model.clone(),
            });
        }

        if settings.transcription.max_retries == 0 {
            bail!("max_retries must be at least 1");
        }

        let provider_is_local = settings.transcription.provider.is_local();
        let (mode, config_error) = SessionController::resolve_mode(
            settings.recording.mode,
            provider_is_local,
            settings.recording.allow_remote_continuous,
        );

        let post_processing = if settings.post_processing.enabled {
            let credential = settings
                .post_processing
                .credential(&settings.transcription.api_keys)
                .with_context(|| {
                    format!(
                        "Post-processing enabled but no credential for {}",
                        settings.post_processing.provider.display_name()
                    )
                })?;
            Some(PostProcessConfig {
                provider: settings.post_processing.provider.clone(),
                credential,
                cleanup_model: settings.post_processing.cleanup_model.clone(),
                instruction_model: settings.post_processing.instruction_model.clone(),
                temperature: settings.post_processing.temperature,
                cleanup_prompt: settings.post_processing.cleanup_prompt.clone(),
                instruction_prompt: settings.post_processing.instruction_prompt.clone(),
                cleanup_prompt_file: settings.post_processing.cleanup_prompt_file.clone(),
                instruction_prompt_file: settings.post_processing.instruction_prompt_file.clone(),
            })
        } else {
            None
        };

        let rules = match &settings.rewrite.rules_file {
            Some(path) => load_rules(path),
            None => Vec::new(),
        };

        Ok(Self {
            mode,
            config_error,
            min_duration: Duration::from_millis(settings.recording.min_duration_ms),
            silence_stop: Duration::from_millis(settings.recording.silence_duration_ms),
            continuous_timeout: Duration::from_secs(settings.recording.continuous_timeout_secs),
            silence_threshold: settings.recording.silence_threshold,
            sound_device: settings.recording.sound_device.clone(),
            adapters,
            executor: ExecutorConfig {
                max_retries: settings.transcription.max_retries,
                backoff: Duration::from_millis(settings.transcription.retry_backoff_ms),
                language: settings.transcription.language.clone(),
            },
            rules,
            rewrite_options: settings.rewrite.options(),
            post_processing,
            clipboard_threshold: settings.output.clipboard_threshold,
            data_root: Settings::data_root(),
            keys: settings.keys.clone(),
        })
    }

    /// Map a key-combo identifier to the activation it requests.
    pub fn activation_kind(&self, combo: &str) -> Option<ActivationKind> {
        if combo == self.keys.activation {
            return Some(ActivationKind::Plain);
        }
        if self.keys.llm_cleanup.as_deref() == Some(combo) {
            return Some(ActivationKind::LlmCleanup);
        }
        if self.keys.llm_instruction.as_deref() == Some(combo) {
            return Some(ActivationKind::LlmInstruction);
        }
        if self.keys.text_cleanup.as_deref() == Some(combo) {
            return Some(ActivationKind::TextCleanup);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RecordingMode;

    fn settings_with_key() -> Settings {
        let mut settings = Settings::default();
        settings
            .transcription
            .api_keys
            .insert("openai".to_string(), "sk-test".to_string());
        settings
    }

    #[test]
    fn test_snapshot_resolves_primary_adapter() {
        let config = SessionConfig::snapshot(&settings_with_key()).unwrap();
        assert_eq!(config.adapters.len(), 1);
        assert_eq!(config.adapters[0].credential, "sk-test");
    }

    #[test]
    fn test_snapshot_orders_fallbacks_after_primary() {
        let mut settings = settings_with_key();
        settings
            .transcription
            .api_keys
            .insert("deepgram".to_string(), "dg-test".to_string());
        settings
            .transcription
            .fallbacks
            .push(TranscriptionProvider::Deepgram);

        let config = SessionConfig::snapshot(&settings).unwrap();
        assert_eq!(config.adapters.len(), 2);
        assert_eq!(
            config.adapters[0].backend.kind(),
            TranscriptionProvider::OpenAI
        );
        assert_eq!(
            config.adapters[1].backend.kind(),
            TranscriptionProvider::Deepgram
        );
    }

    #[test]
    fn test_remote_continuous_guard_applies_at_snapshot() {
        let mut settings = settings_with_key();
        settings.recording.mode = RecordingMode::Continuous;

        let config = SessionConfig::snapshot(&settings).unwrap();
        assert_eq!(config.mode, RecordingMode::PressToToggle);
        assert!(config.config_error.is_some());
    }

    #[test]
    fn test_allowed_remote_continuous_keeps_mode() {
        let mut settings = settings_with_key();
        settings.recording.mode = RecordingMode::Continuous;
        settings.recording.allow_remote_continuous = true;

        let config = SessionConfig::snapshot(&settings).unwrap();
        assert_eq!(config.mode, RecordingMode::Continuous);
        assert!(config.config_error.is_none());
    }

    #[test]
    fn test_activation_kind_mapping() {
        let config = SessionConfig::snapshot(&settings_with_key()).unwrap();
        assert_eq!(config.activation_kind("f9"), Some(ActivationKind::Plain));
        assert_eq!(
            config.activation_kind("f10"),
            Some(ActivationKind::LlmCleanup)
        );
        assert_eq!(
            config.activation_kind("f11"),
            Some(ActivationKind::LlmInstruction)
        );
        assert_eq!(
            config.activation_kind("f12"),
            Some(ActivationKind::TextCleanup)
        );
        assert_eq!(config.activation_kind("f1"), None);
    }
}

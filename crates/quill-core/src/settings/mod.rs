//! Persisted user settings.
//!
//! Settings live as JSON under the user config dir
//! (`~/.config/quill/settings.json` on Linux). Loading never fails: a
//! missing or corrupt file yields defaults with a diagnostic. Live settings
//! are only read when a session starts; the engine works from an immutable
//! [`crate::session::SessionConfig`] snapshot so concurrent edits cannot
//! race an in-progress session.

mod post_processing;
mod recording;
mod rewrite;

pub use post_processing::PostProcessingSettings;
pub use recording::RecordingSettings;
pub use rewrite::RewriteSettings;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::config::TranscriptionProvider;

/// Transcription provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionSettings {
    /// Primary provider
    #[serde(default)]
    pub provider: TranscriptionProvider,

    /// Fallback providers, tried in order after the primary
    #[serde(default)]
    pub fallbacks: Vec<TranscriptionProvider>,

    /// API keys by provider identifier
    #[serde(default)]
    pub api_keys: HashMap<String, String>,

    /// Model override (provider default if None)
    #[serde(default)]
    pub model: Option<String>,

    /// Optional language hint passed to providers
    #[serde(default)]
    pub language: Option<String>,

    /// Total transcription attempt budget per recording
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Delay before re-trying the same adapter after a transient failure
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Model path for the local Whisper provider
    #[serde(default)]
    pub whisper_model_path: Option<String>,
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            provider: TranscriptionProvider::default(),
            fallbacks: Vec::new(),
            api_keys: HashMap::new(),
            model: None,
            language: None,
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            whisper_model_path: None,
        }
    }
}

impl TranscriptionSettings {
    /// Resolve the credential for a provider: stored key (or model path for
    /// local), then the provider's environment variable.
    pub fn credential_for(&self, provider: &TranscriptionProvider) -> Option<String> {
        if *provider == TranscriptionProvider::LocalWhisper {
            if let Some(path) = &self.whisper_model_path {
                if !path.is_empty() {
                    return Some(path.clone());
                }
            }
        } else if let Some(key) = self.api_keys.get(provider.as_str()) {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var(provider.api_key_env_var()).ok()
    }
}

/// Output sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Above this many characters text is pasted instead of typed
    #[serde(default = "default_clipboard_threshold")]
    pub clipboard_threshold: usize,
}

fn default_clipboard_threshold() -> usize {
    1000
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            clipboard_threshold: default_clipboard_threshold(),
        }
    }
}

/// Activation key combos, matched against incoming key events by identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeySettings {
    /// Plain dictation
    #[serde(default = "default_activation")]
    pub activation: String,

    /// Dictation followed by LLM cleanup
    #[serde(default)]
    pub llm_cleanup: Option<String>,

    /// Dictation treated as an LLM instruction
    #[serde(default)]
    pub llm_instruction: Option<String>,

    /// Clean the supplied (clipboard) text without recording
    #[serde(default)]
    pub text_cleanup: Option<String>,
}

fn default_activation() -> String {
    "f9".to_string()
}

impl Default for KeySettings {
    fn default() -> Self {
        Self {
            activation: default_activation(),
            llm_cleanup: Some("f10".to_string()),
            llm_instruction: Some("f11".to_string()),
            text_cleanup: Some("f12".to_string()),
        }
    }
}

/// All persisted settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub recording: RecordingSettings,

    #[serde(default)]
    pub transcription: TranscriptionSettings,

    #[serde(default)]
    pub post_processing: PostProcessingSettings,

    #[serde(default)]
    pub rewrite: RewriteSettings,

    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub keys: KeySettings,
}

impl Settings {
    /// Path of the settings file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quill")
            .join("settings.json")
    }

    /// Root directory for app data (failed-audio archive lives here).
    pub fn data_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quill")
    }

    /// Load settings, falling back to defaults on a missing or corrupt file.
    pub fn load() -> Self {
        let path = Self::config_path();
        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    crate::verbose!("Corrupt settings file {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist settings, creating the config directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(&path, content).context("Failed to write settings file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_round_trip() {
        let mut settings = Settings::default();
        settings.transcription.max_retries = 5;
        settings
            .transcription
            .api_keys
            .insert("openai".to_string(), "sk-test".to_string());

        let json = serde_json::to_string(&settings).unwrap();
        let restored: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.transcription.max_retries, 5);
        assert_eq!(
            restored.transcription.credential_for(&TranscriptionProvider::OpenAI),
            Some("sk-test".to_string())
        );
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let restored: Settings = serde_json::from_str(r#"{"recording":{}}"#).unwrap();
        assert_eq!(restored.recording.min_duration_ms, 100);
        assert_eq!(restored.transcription.max_retries, 3);
        assert_eq!(restored.output.clipboard_threshold, 1000);
    }
}

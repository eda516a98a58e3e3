//! Post-processing settings for LLM-based transcript cleanup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::CompletionProvider;
use crate::transcription::{DEFAULT_CLEANUP_PROMPT, DEFAULT_INSTRUCTION_PROMPT};

/// Settings for post-processing transcripts with LLMs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostProcessingSettings {
    /// Whether post-processing is enabled
    #[serde(default)]
    pub enabled: bool,

    /// LLM provider for post-processing
    #[serde(default)]
    pub provider: CompletionProvider,

    /// API key for the completion provider (falls back to the shared
    /// transcription keys, then the provider's environment variable)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Ollama server URL (only used when provider is Ollama)
    #[serde(default)]
    pub ollama_url: Option<String>,

    /// Model for cleanup mode (provider default if None)
    #[serde(default)]
    pub cleanup_model: Option<String>,

    /// Model for instruction mode (provider default if None)
    #[serde(default)]
    pub instruction_model: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// System prompt for cleanup and clipboard-cleanup modes
    #[serde(default = "default_cleanup_prompt")]
    pub cleanup_prompt: String,

    /// System prompt for instruction mode
    #[serde(default = "default_instruction_prompt")]
    pub instruction_prompt: String,

    /// Optional file whose content extends the cleanup prompt
    #[serde(default)]
    pub cleanup_prompt_file: Option<PathBuf>,

    /// Optional file whose content extends the instruction prompt
    #[serde(default)]
    pub instruction_prompt_file: Option<PathBuf>,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_cleanup_prompt() -> String {
    DEFAULT_CLEANUP_PROMPT.to_string()
}

fn default_instruction_prompt() -> String {
    DEFAULT_INSTRUCTION_PROMPT.to_string()
}

impl Default for PostProcessingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: CompletionProvider::default(),
            api_key: None,
            ollama_url: None,
            cleanup_model: None,
            instruction_model: None,
            temperature: default_temperature(),
            cleanup_prompt: default_cleanup_prompt(),
            instruction_prompt: default_instruction_prompt(),
            cleanup_prompt_file: None,
            instruction_prompt_file: None,
        }
    }
}

impl PostProcessingSettings {
    /// Resolve the credential for the configured completion provider.
    ///
    /// For Ollama this is the server URL; for cloud providers the lookup
    /// order is own key, shared transcription key, environment variable.
    pub fn credential(&self, transcription_api_keys: &HashMap<String, String>) -> Option<String> {
        if self.provider == CompletionProvider::Ollama {
            return Some(
                self.ollama_url
                    .clone()
                    .unwrap_or_else(|| crate::provider::DEFAULT_OLLAMA_URL.to_string()),
            );
        }

        if let Some(key) = &self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        if let Some(key) = transcription_api_keys.get(self.provider.as_str()) {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var(self.provider.api_key_env_var()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_credential_is_url() {
        let settings = PostProcessingSettings {
            provider: CompletionProvider::Ollama,
            ..Default::default()
        };
        assert_eq!(
            settings.credential(&HashMap::new()),
            Some(crate::provider::DEFAULT_OLLAMA_URL.to_string())
        );
    }

    #[test]
    fn test_cloud_credential_prefers_own_key() {
        let settings = PostProcessingSettings {
            provider: CompletionProvider::OpenAI,
            api_key: Some("own-key".to_string()),
            ..Default::default()
        };
        let mut shared = HashMap::new();
        shared.insert("openai".to_string(), "shared-key".to_string());
        assert_eq!(settings.credential(&shared), Some("own-key".to_string()));
    }

    #[test]
    fn test_cloud_credential_falls_back_to_shared() {
        let settings = PostProcessingSettings {
            provider: CompletionProvider::OpenAI,
            ..Default::default()
        };
        let mut shared = HashMap::new();
        shared.insert("openai".to_string(), "shared-key".to_string());
        assert_eq!(settings.credential(&shared), Some("shared-key".to_string()));
    }
}

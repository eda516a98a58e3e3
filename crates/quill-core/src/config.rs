use serde::{Deserialize, Serialize};
use std::fmt;

/// Available transcription providers
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProvider {
    #[default]
    OpenAI,
    Groq,
    Deepgram,
    #[serde(rename = "local-whisper")]
    LocalWhisper,
}

impl TranscriptionProvider {
    /// Get the string identifier for this provider
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptionProvider::OpenAI => "openai",
            TranscriptionProvider::Groq => "groq",
            TranscriptionProvider::Deepgram => "deepgram",
            TranscriptionProvider::LocalWhisper => "local-whisper",
        }
    }

    /// Get the environment variable name for this provider's API key (or model path for local)
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            TranscriptionProvider::OpenAI => "OPENAI_API_KEY",
            TranscriptionProvider::Groq => "GROQ_API_KEY",
            TranscriptionProvider::Deepgram => "DEEPGRAM_API_KEY",
            TranscriptionProvider::LocalWhisper => "LOCAL_WHISPER_MODEL_PATH",
        }
    }

    /// List all available providers
    pub fn all() -> &'static [TranscriptionProvider] {
        &[
            TranscriptionProvider::OpenAI,
            TranscriptionProvider::Groq,
            TranscriptionProvider::Deepgram,
            TranscriptionProvider::LocalWhisper,
        ]
    }

    /// Human-readable display name for this provider
    pub fn display_name(&self) -> &'static str {
        match self {
            TranscriptionProvider::OpenAI => "OpenAI",
            TranscriptionProvider::Groq => "Groq",
            TranscriptionProvider::Deepgram => "Deepgram",
            TranscriptionProvider::LocalWhisper => "Local Whisper",
        }
    }

    /// Whether this provider requires an API key (vs a model path for local)
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, TranscriptionProvider::LocalWhisper)
    }

    /// Whether this provider runs on-device.
    ///
    /// Continuous recording against a non-local provider is refused unless
    /// explicitly allowed in the recording settings.
    pub fn is_local(&self) -> bool {
        matches!(self, TranscriptionProvider::LocalWhisper)
    }
}

impl fmt::Display for TranscriptionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TranscriptionProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(TranscriptionProvider::OpenAI),
            "groq" => Ok(TranscriptionProvider::Groq),
            "deepgram" => Ok(TranscriptionProvider::Deepgram),
            "local-whisper" | "localwhisper" | "whisper" => Ok(TranscriptionProvider::LocalWhisper),
            _ => Err(format!(
                "Unknown provider: {}. Available: openai, groq, deepgram, local-whisper",
                s
            )),
        }
    }
}

/// Available completion providers (LLM post-processing)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CompletionProvider {
    #[default]
    OpenAI,
    Claude,
    Gemini,
    Groq,
    Ollama,
}

impl CompletionProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionProvider::OpenAI => "openai",
            CompletionProvider::Claude => "claude",
            CompletionProvider::Gemini => "gemini",
            CompletionProvider::Groq => "groq",
            CompletionProvider::Ollama => "ollama",
        }
    }

    /// Environment variable consulted when no key is stored in settings.
    /// Ollama takes a server URL rather than a key.
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            CompletionProvider::OpenAI => "OPENAI_API_KEY",
            CompletionProvider::Claude => "ANTHROPIC_API_KEY",
            CompletionProvider::Gemini => "GEMINI_API_KEY",
            CompletionProvider::Groq => "GROQ_API_KEY",
            CompletionProvider::Ollama => "OLLAMA_URL",
        }
    }

    pub fn all() -> &'static [CompletionProvider] {
        &[
            CompletionProvider::OpenAI,
            CompletionProvider::Claude,
            CompletionProvider::Gemini,
            CompletionProvider::Groq,
            CompletionProvider::Ollama,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CompletionProvider::OpenAI => "OpenAI",
            CompletionProvider::Claude => "Claude",
            CompletionProvider::Gemini => "Gemini",
            CompletionProvider::Groq => "Groq",
            CompletionProvider::Ollama => "Ollama",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, CompletionProvider::Ollama)
    }
}

impl fmt::Display for CompletionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CompletionProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "chatgpt" => Ok(CompletionProvider::OpenAI),
            "claude" | "anthropic" => Ok(CompletionProvider::Claude),
            "gemini" => Ok(CompletionProvider::Gemini),
            "groq" => Ok(CompletionProvider::Groq),
            "ollama" => Ok(CompletionProvider::Ollama),
            _ => Err(format!(
                "Unknown completion provider: {}. Available: openai, claude, gemini, groq, ollama",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_round_trip() {
        for provider in TranscriptionProvider::all() {
            let parsed: TranscriptionProvider = provider.as_str().parse().unwrap();
            assert_eq!(&parsed, provider);
        }
    }

    #[test]
    fn test_only_local_whisper_is_local() {
        for provider in TranscriptionProvider::all() {
            assert_eq!(
                provider.is_local(),
                matches!(provider, TranscriptionProvider::LocalWhisper)
            );
        }
    }
}

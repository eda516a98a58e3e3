//! LLM-based transcript post-processing.
//!
//! Raw transcripts often contain filler words, grammar issues and run-on
//! sentences. This stage sends the candidate text, together with an
//! assembled system instruction, to a configured completion adapter.
//!
//! Three mutually exclusive entry modes exist:
//! - **cleanup** — tidy a fresh transcript after the find/replace stage
//! - **instruction** — treat the transcript as an instruction to execute
//! - **clipboard-cleanup** — clean caller-supplied text directly, bypassing
//!   the find/replace stage
//!
//! Adapters that support structured responses are asked for the fixed
//! single-field schema `{processed_and_cleaned_transcript: string}`. Any
//! parse failure falls back to the full raw response body; a provider error
//! falls back to the unprocessed input. Neither fallback fails upward.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CompletionProvider;
use crate::error::ParseError;
use crate::provider::{CompletionRequest, registry};

pub const DEFAULT_CLEANUP_PROMPT: &str = "Clean up this voice transcript. \
Remove filler words (um, uh, like, you know). \
Fix grammar and punctuation. Keep technical terms intact. \
Output only the cleaned text, no explanations.";

pub const DEFAULT_INSTRUCTION_PROMPT: &str = "The user dictated an instruction. \
Carry it out and reply with only the requested output, no explanations.";

/// Entry mode for the post-processing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmMode {
    Cleanup,
    Instruction,
    ClipboardCleanup,
}

/// Post-processing configuration captured in the session snapshot.
#[derive(Debug, Clone)]
pub struct PostProcessConfig {
    pub provider: CompletionProvider,
    /// API key, or server URL for Ollama.
    pub credential: String,
    pub cleanup_model: Option<String>,
    pub instruction_model: Option<String>,
    pub temperature: f32,
    pub cleanup_prompt: String,
    pub instruction_prompt: String,
    pub cleanup_prompt_file: Option<PathBuf>,
    pub instruction_prompt_file: Option<PathBuf>,
}

/// Response shape requested from and parsed for a completion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Structured,
    Plain,
}

/// The raw completion body together with what was extracted from it.
#[derive(Debug, Clone)]
pub struct LlmResponseEnvelope {
    pub raw: String,
    pub schema: SchemaKind,
    pub text: String,
    pub parsed: bool,
}

#[derive(Deserialize)]
struct StructuredTranscript {
    processed_and_cleaned_transcript: String,
}

/// Assemble the system instruction: the base prompt from settings, optionally
/// extended with the trimmed content of a prompt file.
///
/// Missing, unreadable or empty files are skipped with a diagnostic; this
/// function never fails.
pub fn assemble_system_message(base: &str, prompt_file: Option<&Path>) -> String {
    let mut message = base.trim().to_string();

    let Some(path) = prompt_file else {
        return message;
    };

    if !path.exists() {
        crate::verbose!("Prompt file not found: {}, using base prompt only", path.display());
        return message;
    }

    match fs::read_to_string(path) {
        Ok(content) => {
            let content = content.trim();
            if content.is_empty() {
                return message;
            }
            if message.is_empty() {
                message = content.to_string();
            } else {
                message = format!("{message}\n\n{content}");
            }
        }
        Err(e) => {
            crate::verbose!("Failed to read prompt file {}: {e}", path.display());
        }
    }

    message
}

/// Extract the final text from a completion body.
///
/// Structured bodies are parsed against the fixed transcript schema; on any
/// parse failure the full raw body is used unchanged.
pub fn extract_envelope(raw: String, schema: SchemaKind) -> LlmResponseEnvelope {
    match schema {
        SchemaKind::Structured => match parse_structured(&raw) {
            Ok(text) => LlmResponseEnvelope {
                raw,
                schema,
                text,
                parsed: true,
            },
            Err(e) => {
                crate::verbose!("{e}; falling back to raw response body");
                LlmResponseEnvelope {
                    text: raw.clone(),
                    raw,
                    schema,
                    parsed: false,
                }
            }
        },
        SchemaKind::Plain => LlmResponseEnvelope {
            text: raw.clone(),
            raw,
            schema,
            parsed: false,
        },
    }
}

fn parse_structured(raw: &str) -> Result<String, ParseError> {
    let parsed: StructuredTranscript = serde_json::from_str(raw).map_err(|e| ParseError {
        message: e.to_string(),
    })?;
    Ok(parsed.processed_and_cleaned_transcript)
}

/// Run the post-processing stage.
///
/// Every failure path falls back to a usable string: a provider error or an
/// empty system message returns the input unchanged, and a structured-parse
/// failure returns the raw response body.
pub fn post_process(text: &str, mode: LlmMode, config: &PostProcessConfig) -> String {
    if text.is_empty() {
        return text.to_string();
    }

    let (base_prompt, prompt_file, model) = match mode {
        LlmMode::Cleanup | LlmMode::ClipboardCleanup => (
            config.cleanup_prompt.as_str(),
            config.cleanup_prompt_file.as_deref(),
            config.cleanup_model.clone(),
        ),
        LlmMode::Instruction => (
            config.instruction_prompt.as_str(),
            config.instruction_prompt_file.as_deref(),
            config.instruction_model.clone(),
        ),
    };

    let system = assemble_system_message(base_prompt, prompt_file);
    if system.is_empty() {
        crate::verbose!("No system message configured, using original text");
        return text.to_string();
    }

    let backend = match registry().completer(&config.provider) {
        Ok(backend) => backend,
        Err(e) => {
            crate::verbose!("Post-processing unavailable: {e}");
            return text.to_string();
        }
    };

    let structured = backend.supports_structured();
    let request = CompletionRequest {
        system,
        user: text.to_string(),
        model,
        temperature: config.temperature,
        structured,
    };

    match backend.complete(&config.credential, &request) {
        Ok(raw) => {
            let schema = if structured {
                SchemaKind::Structured
            } else {
                SchemaKind::Plain
            };
            extract_envelope(raw, schema).text.trim().to_string()
        }
        Err(e) => {
            crate::verbose!("Post-processing via {} failed: {e}", backend.name());
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_structured_body_extracts_field() {
        let raw = r#"{"processed_and_cleaned_transcript":"hello world"}"#.to_string();
        let envelope = extract_envelope(raw, SchemaKind::Structured);
        assert!(envelope.parsed);
        assert_eq!(envelope.text, "hello world");
    }

    #[test]
    fn test_non_json_body_falls_back_unchanged() {
        let envelope = extract_envelope("hello world".to_string(), SchemaKind::Structured);
        assert!(!envelope.parsed);
        assert_eq!(envelope.text, "hello world");
    }

    #[test]
    fn test_missing_field_falls_back_to_raw() {
        let raw = r#"{"transcript":"hello"}"#.to_string();
        let envelope = extract_envelope(raw.clone(), SchemaKind::Structured);
        assert!(!envelope.parsed);
        assert_eq!(envelope.text, raw);
    }

    #[test]
    fn test_plain_schema_is_never_parsed() {
        let raw = r#"{"processed_and_cleaned_transcript":"hello"}"#.to_string();
        let envelope = extract_envelope(raw.clone(), SchemaKind::Plain);
        assert!(!envelope.parsed);
        assert_eq!(envelope.text, raw);
    }

    #[test]
    fn test_assemble_appends_file_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  extra context  ").unwrap();
        let message = assemble_system_message("base prompt", Some(file.path()));
        assert_eq!(message, "base prompt\n\nextra context");
    }

    #[test]
    fn test_assemble_skips_missing_file() {
        let message =
            assemble_system_message("base prompt", Some(Path::new("/nonexistent/prompt.txt")));
        assert_eq!(message, "base prompt");
    }

    #[test]
    fn test_assemble_uses_file_when_base_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "only the file").unwrap();
        let message = assemble_system_message("", Some(file.path()));
        assert_eq!(message, "only the file");
    }
}

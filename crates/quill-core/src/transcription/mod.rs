//! Transcription execution and post-processing.
//!
//! This module contains:
//! - The retry/fallback executor that turns a captured buffer into text
//! - LLM post-processing (cleanup, instruction and clipboard-cleanup modes)

mod executor;
mod post_processing;

pub use executor::{
    AttemptOutcome, ConfiguredAdapter, ExecutorConfig, TranscriptionAttempt, TranscriptionResult,
    execute,
};
pub use post_processing::{
    DEFAULT_CLEANUP_PROMPT, DEFAULT_INSTRUCTION_PROMPT, LlmMode, LlmResponseEnvelope,
    PostProcessConfig, SchemaKind, assemble_system_message, extract_envelope, post_process,
};

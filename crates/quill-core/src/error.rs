//! Typed error taxonomy for the dictation pipeline.
//!
//! Every boundary in quill converts failures into one of these types before
//! returning; nothing here is allowed to escape as a process-terminating
//! panic. Recovery policy:
//!
//! - [`ValidationError`] and [`ParseError`] are always recovered locally
//!   (discard the input or fall back to plain text).
//! - [`ProviderError`] with a transient kind consumes retry budget; auth and
//!   empty-result kinds skip the remaining retries on that adapter.
//! - [`ExhaustedError`] is reported to the user together with the archiver
//!   outcome; the session returns to idle.

use thiserror::Error;

use crate::transcription::TranscriptionAttempt;

/// Bad input detected before an operation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("audio buffer is missing")]
    BufferMissing,
    #[error("audio buffer is empty")]
    BufferEmpty,
    #[error("sample rate is not set")]
    SampleRateMissing,
}

/// Classification of a provider failure, used by the executor's retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Network error, timeout, or a retryable server-side failure.
    Transient,
    /// Rejected credentials; retrying the same adapter cannot help.
    Auth,
    /// The provider answered but produced no usable text.
    EmptyResult,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::Transient => "transient",
            ProviderErrorKind::Auth => "auth",
            ProviderErrorKind::EmptyResult => "empty_result",
        }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure returned by a transcription or completion adapter.
#[derive(Debug, Clone, Error)]
#[error("{kind} provider error: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Auth,
            message: message.into(),
        }
    }

    pub fn empty_result(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::EmptyResult,
            message: message.into(),
        }
    }

    /// Classify an HTTP status into an error kind.
    ///
    /// 401/403 are credential problems; everything else that reaches us as a
    /// non-success status is treated as retryable.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        let message = format!("HTTP {status}: {body}");
        match status.as_u16() {
            401 | 403 => Self::auth(message),
            _ => Self::transient(message),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::transient(err.to_string())
    }
}

/// Failure while persisting failed audio to disk.
#[derive(Debug, Error)]
#[error("archive write failed: {message}")]
pub struct PersistenceError {
    pub message: String,
}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Structured-output decode failure; always recovered by falling back to the
/// raw response body.
#[derive(Debug, Clone, Error)]
#[error("structured response parse failed: {message}")]
pub struct ParseError {
    pub message: String,
}

/// All transcription attempts failed; carries the complete ordered history.
#[derive(Debug, Error)]
#[error("transcription failed after {} attempts", .attempts.len())]
pub struct ExhaustedError {
    pub attempts: Vec<TranscriptionAttempt>,
}

pub mod archive;
pub mod audio;
pub mod config;
pub mod error;
pub mod output;
pub mod provider;
pub mod rewrite;
pub mod session;
pub mod settings;
pub mod transcription;
pub mod verbose;

pub use archive::{ArchiveOutcome, archive_failed_audio};
pub use audio::{AudioBuffer, AudioRecorder, EnergyVad, RecorderConfig};
pub use config::{CompletionProvider, TranscriptionProvider};
pub use error::{
    ExhaustedError, ParseError, PersistenceError, ProviderError, ProviderErrorKind,
    ValidationError,
};
pub use output::{DeliveryMethod, OutputSink, delivery_method};
#[cfg(feature = "clipboard")]
pub use output::ClipboardSink;
pub use provider::{
    CompletionBackend, CompletionRequest, TranscriptionBackend, TranscriptionRequest, registry,
};
pub use rewrite::{FindReplaceRule, RewriteOptions, TransformOp, apply_pipeline, apply_rules};
pub use session::{
    ActivationKind, Edge, EngineHandle, KeyEvent, RecordingMode, SessionConfig, SessionOutcome,
};
pub use settings::Settings;
pub use transcription::{
    LlmMode, TranscriptionAttempt, TranscriptionResult, post_process,
};
pub use verbose::set_verbose;

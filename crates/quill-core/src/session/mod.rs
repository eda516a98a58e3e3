//! Recording session lifecycle.
//!
//! A session exists from an activation edge to its mode-defined stop
//! condition. The controller is a pure state machine; the engine owns the
//! worker thread that drives capture, the controller and the executor.

mod config;
mod controller;
mod engine;

pub use config::{ActivationKind, SessionConfig};
pub use controller::{ControlAction, DiscardReason, SessionController, SessionState};
pub use engine::{EngineCommand, EngineHandle, SessionOutcome, spawn};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::audio::AudioBuffer;
use crate::transcription::LlmMode;

/// Edge of a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Press,
    Release,
}

/// One event from the key-event source.
#[derive(Debug, Clone)]
pub struct KeyEvent {
    /// Key-combo identifier, matched against the configured activation keys.
    pub combo: String,
    pub edge: Edge,
}

/// Trigger mode for recording sessions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordingMode {
    /// Second activation event stops the recording
    #[default]
    PressToToggle,
    /// Key release stops the recording
    HoldToRecord,
    /// First sufficient silence run after speech stops the recording
    VoiceActivityDetection,
    /// Auto-restarts capture after each speech pause until stopped
    Continuous,
}

impl RecordingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingMode::PressToToggle => "press_to_toggle",
            RecordingMode::HoldToRecord => "hold_to_record",
            RecordingMode::VoiceActivityDetection => "voice_activity_detection",
            RecordingMode::Continuous => "continuous",
        }
    }
}

impl fmt::Display for RecordingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RecordingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "press_to_toggle" | "toggle" => Ok(RecordingMode::PressToToggle),
            "hold_to_record" | "hold" => Ok(RecordingMode::HoldToRecord),
            "voice_activity_detection" | "vad" => Ok(RecordingMode::VoiceActivityDetection),
            "continuous" => Ok(RecordingMode::Continuous),
            _ => Err(format!(
                "Unknown recording mode: {}. Available: press_to_toggle, hold_to_record, voice_activity_detection, continuous",
                s
            )),
        }
    }
}

/// One active recording with its exclusively-owned buffer.
///
/// The buffer is moved out (never cloned, never aliased) when it is handed
/// to the transcription executor at stop.
pub struct RecordingSession {
    pub mode: RecordingMode,
    pub state: SessionState,
    pub started_at: Instant,
    pub activation_key: String,
    /// Post-processing requested by the activation combo, if any.
    pub llm: Option<LlmMode>,
    pub buffer: AudioBuffer,
}

impl RecordingSession {
    pub fn new(
        mode: RecordingMode,
        activation_key: String,
        llm: Option<LlmMode>,
        buffer: AudioBuffer,
    ) -> Self {
        Self {
            mode,
            state: SessionState::Arming,
            started_at: Instant::now(),
            activation_key,
            llm,
            buffer,
        }
    }
}

//! Recording and capture settings.

use serde::{Deserialize, Serialize};

use crate::audio::DEFAULT_ENERGY_THRESHOLD;
use crate::session::RecordingMode;

/// Settings for capture and session stop conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSettings {
    /// Trigger mode for recording sessions
    #[serde(default)]
    pub mode: RecordingMode,

    /// Preferred capture sample rate in Hz (the device's native rate wins)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Recordings shorter than this are discarded, never transcribed
    #[serde(default = "default_min_duration_ms")]
    pub min_duration_ms: u64,

    /// Silence run that ends an utterance in VAD and continuous modes
    #[serde(default = "default_silence_duration_ms")]
    pub silence_duration_ms: u64,

    /// Accumulated speechless time that force-stops continuous mode
    #[serde(default = "default_continuous_timeout_secs")]
    pub continuous_timeout_secs: u64,

    /// Short-time energy threshold separating speech from silence
    #[serde(default = "default_silence_threshold")]
    pub silence_threshold: f32,

    /// Capture device name (None = system default)
    #[serde(default)]
    pub sound_device: Option<String>,

    /// Allow continuous mode against non-local providers.
    ///
    /// Without this flag the controller refuses the mode, logs a
    /// configuration error and behaves as press-to-toggle.
    #[serde(default)]
    pub allow_remote_continuous: bool,
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_min_duration_ms() -> u64 {
    100
}

fn default_silence_duration_ms() -> u64 {
    900
}

fn default_continuous_timeout_secs() -> u64 {
    30
}

fn default_silence_threshold() -> f32 {
    DEFAULT_ENERGY_THRESHOLD
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            mode: RecordingMode::default(),
            sample_rate: default_sample_rate(),
            min_duration_ms: default_min_duration_ms(),
            silence_duration_ms: default_silence_duration_ms(),
            continuous_timeout_secs: default_continuous_timeout_secs(),
            silence_threshold: default_silence_threshold(),
            sound_device: None,
            allow_remote_continuous: false,
        }
    }
}

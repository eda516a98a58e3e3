//! Local transcription using Whisper via transcribe-rs.
//!
//! This adapter enables offline transcription without API calls. The
//! credential slot carries the model path. The loaded engine is cached
//! globally so repeated sessions do not pay the model-load cost.

use std::io::Cursor;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use transcribe_rs::TranscriptionEngine;
use transcribe_rs::engines::whisper::{WhisperEngine, WhisperInferenceParams};

use super::{TranscriptionBackend, TranscriptionRequest};
use crate::config::TranscriptionProvider;
use crate::error::ProviderError;

/// Sample rate expected by Whisper models.
const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Local Whisper transcription provider
#[derive(Debug, Default, Clone)]
pub struct LocalWhisperProvider;

struct CachedEngine {
    engine: WhisperEngine,
    path: String,
}

static WHISPER_ENGINE: OnceLock<Mutex<Option<CachedEngine>>> = OnceLock::new();

fn engine_cache() -> &'static Mutex<Option<CachedEngine>> {
    WHISPER_ENGINE.get_or_init(|| Mutex::new(None))
}

impl TranscriptionBackend for LocalWhisperProvider {
    fn name(&self) -> &'static str {
        "local-whisper"
    }

    fn kind(&self) -> TranscriptionProvider {
        TranscriptionProvider::LocalWhisper
    }

    fn transcribe(
        &self,
        model_path: &str,
        request: &TranscriptionRequest,
    ) -> Result<String, ProviderError> {
        if model_path.is_empty() {
            return Err(ProviderError::auth(
                "Whisper model path not configured. Set LOCAL_WHISPER_MODEL_PATH or use: quill config --whisper-model-path <path>",
            ));
        }
        if !Path::new(model_path).exists() {
            return Err(ProviderError::auth(format!(
                "Whisper model not found at: {model_path}"
            )));
        }

        let samples = decode_wav(&request.audio_data)?;

        let mut cache = engine_cache()
            .lock()
            .map_err(|_| ProviderError::transient("Whisper engine lock poisoned"))?;

        let needs_load = match cache.as_ref() {
            Some(cached) => cached.path != model_path,
            None => true,
        };
        if needs_load {
            let mut engine = WhisperEngine::new();
            engine
                .load_model(Path::new(model_path))
                .map_err(|e| ProviderError::transient(format!("Failed to load Whisper model: {e}")))?;
            *cache = Some(CachedEngine {
                engine,
                path: model_path.to_string(),
            });
        }

        let cached = cache
            .as_mut()
            .ok_or_else(|| ProviderError::transient("Whisper engine cache empty after load"))?;

        let params = WhisperInferenceParams {
            language: request.language.clone(),
            ..Default::default()
        };

        let result = cached
            .engine
            .transcribe_samples(samples, Some(params))
            .map_err(|e| ProviderError::transient(format!("Whisper transcription failed: {e}")))?;

        Ok(result.text.trim().to_string())
    }
}

/// Decode the uploaded WAV payload back into 16kHz mono f32 samples.
fn decode_wav(wav_bytes: &[u8]) -> Result<Vec<f32>, ProviderError> {
    let reader = hound::WavReader::new(Cursor::new(wav_bytes))
        .map_err(|e| ProviderError::transient(format!("Failed to read WAV payload: {e}")))?;
    let spec = reader.spec();

    if spec.sample_rate != WHISPER_SAMPLE_RATE {
        return Err(ProviderError::transient(format!(
            "Local Whisper requires {WHISPER_SAMPLE_RATE}Hz audio, got {}Hz",
            spec.sample_rate
        )));
    }

    let samples: Result<Vec<f32>, _> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .into_samples::<i16>()
            .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
            .collect(),
        hound::SampleFormat::Float => reader.into_samples::<f32>().collect(),
    };

    samples.map_err(|e| ProviderError::transient(format!("Failed to decode WAV payload: {e}")))
}

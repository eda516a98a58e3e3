//! Failed-audio persistence safety net.
//!
//! Invoked only when the transcription executor is exhausted: the recording
//! must never be silently lost, so the buffer is validated and written
//! losslessly (32-bit float WAV) to a timestamp-named file under
//! `<app-data-root>/failed_audio/`.
//!
//! Every failure path here converts locally into a reportable outcome.
//! Nothing propagates: the caller always gets either the saved path or the
//! specific reason, and emits exactly one human-readable status line.

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::AudioBuffer;
use crate::error::{PersistenceError, ValidationError};

/// Directory under the app data root that collects failed recordings.
pub const FAILED_AUDIO_DIR: &str = "failed_audio";

/// Result of an archive request, always reportable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Saved(PathBuf),
    NotSaved { reason: String },
}

impl ArchiveOutcome {
    /// The single status line the caller must emit.
    pub fn status_line(&self) -> String {
        match self {
            ArchiveOutcome::Saved(path) => format!("audio saved at {}", path.display()),
            ArchiveOutcome::NotSaved { reason } => format!("audio NOT saved: {reason}"),
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, ArchiveOutcome::Saved(_))
    }
}

/// Check a buffer before attempting to persist it.
pub fn validate(buffer: Option<&AudioBuffer>) -> Result<(), ValidationError> {
    let Some(buffer) = buffer else {
        return Err(ValidationError::BufferMissing);
    };
    if buffer.is_empty() {
        return Err(ValidationError::BufferEmpty);
    }
    if buffer.sample_rate() == 0 {
        return Err(ValidationError::SampleRateMissing);
    }
    Ok(())
}

/// Validate and persist a failed recording under `data_root`.
///
/// Returns the absolute path on success; all validation and I/O failures are
/// converted to [`ArchiveOutcome::NotSaved`] with the specific reason.
pub fn archive_failed_audio(buffer: Option<&AudioBuffer>, data_root: &Path) -> ArchiveOutcome {
    let buffer = match buffer {
        Some(buffer) => buffer,
        None => {
            return ArchiveOutcome::NotSaved {
                reason: ValidationError::BufferMissing.to_string(),
            };
        }
    };
    if let Err(e) = validate(Some(buffer)) {
        return ArchiveOutcome::NotSaved {
            reason: e.to_string(),
        };
    }

    let dir = data_root.join(FAILED_AUDIO_DIR);
    if let Err(e) = fs::create_dir_all(&dir) {
        return ArchiveOutcome::NotSaved {
            reason: PersistenceError::from(e).to_string(),
        };
    }

    let timestamp = Utc::now().format("%Y%m%d-%H%M%S");
    let path = dir.join(format!("failed_{timestamp}.wav"));

    crate::verbose!(
        "Saving failed audio ({} samples at {}Hz) to {}",
        buffer.len(),
        buffer.sample_rate(),
        path.display()
    );

    match write_wav(buffer, &path) {
        Ok(()) => {
            let absolute = path.canonicalize().unwrap_or(path);
            ArchiveOutcome::Saved(absolute)
        }
        Err(e) => ArchiveOutcome::NotSaved {
            reason: e.to_string(),
        },
    }
}

/// Write the buffer as 32-bit float WAV, lossless for the captured samples.
fn write_wav(buffer: &AudioBuffer, path: &Path) -> Result<(), PersistenceError> {
    let spec = hound::WavSpec {
        channels: buffer.channels().max(1),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| PersistenceError {
        message: e.to_string(),
    })?;
    for &sample in buffer.samples() {
        writer.write_sample(sample).map_err(|e| PersistenceError {
            message: e.to_string(),
        })?;
    }
    writer.finalize().map_err(|e| PersistenceError {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::EnergyVad;

    fn buffer_with_samples(sample_rate: u32, seconds: f32) -> AudioBuffer {
        let mut buffer = AudioBuffer::new(sample_rate, 1, EnergyVad::default());
        let count = (sample_rate as f32 * seconds) as usize;
        buffer.push_samples(&vec![0.25f32; count]);
        buffer
    }

    #[test]
    fn test_validate_missing_buffer() {
        assert_eq!(validate(None), Err(ValidationError::BufferMissing));
    }

    #[test]
    fn test_validate_empty_buffer() {
        let buffer = AudioBuffer::new(16000, 1, EnergyVad::default());
        assert_eq!(validate(Some(&buffer)), Err(ValidationError::BufferEmpty));
    }

    #[test]
    fn test_validate_missing_sample_rate() {
        let mut buffer = AudioBuffer::new(0, 1, EnergyVad::default());
        buffer.push_samples(&[0.1; 64]);
        // rate 0 means the frame size collapses to a minimum, samples still land
        assert_eq!(
            validate(Some(&buffer)),
            Err(ValidationError::SampleRateMissing)
        );
    }

    #[test]
    fn test_invalid_buffer_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = archive_failed_audio(None, dir.path());
        assert!(!outcome.is_saved());
        assert!(!dir.path().join(FAILED_AUDIO_DIR).exists());
    }

    #[test]
    fn test_archive_writes_timestamped_wav() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = buffer_with_samples(16000, 0.5);
        let outcome = archive_failed_audio(Some(&buffer), dir.path());

        let ArchiveOutcome::Saved(path) = &outcome else {
            panic!("expected saved outcome, got {outcome:?}");
        };
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("failed_"));
        assert!(name.ends_with(".wav"));

        let reader = hound::WavReader::open(path).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.len() as usize, buffer.len());
    }

    #[test]
    fn test_status_lines() {
        let saved = ArchiveOutcome::Saved(PathBuf::from("/tmp/failed_x.wav"));
        assert_eq!(saved.status_line(), "audio saved at /tmp/failed_x.wav");

        let not_saved = ArchiveOutcome::NotSaved {
            reason: "audio buffer is empty".to_string(),
        };
        assert_eq!(
            not_saved.status_line(),
            "audio NOT saved: audio buffer is empty"
        );
    }

    #[test]
    fn test_unwritable_root_reports_reason() {
        let outcome = archive_failed_audio(
            Some(&buffer_with_samples(16000, 0.1)),
            Path::new("/proc/nonexistent-root"),
        );
        assert!(!outcome.is_saved());
    }
}

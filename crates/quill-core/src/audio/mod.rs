//! Audio capture and encoding.

mod buffer;
mod recorder;
mod vad;

pub use buffer::{AudioBuffer, FRAME_DURATION_MS};
pub use recorder::{AudioRecorder, RecorderConfig};
pub use vad::{DEFAULT_ENERGY_THRESHOLD, EnergyVad};

use anyhow::{Context, Result};
use std::io::Cursor;

/// Encode f32 samples as a 16-bit PCM WAV byte stream for upload.
pub fn encode_wav_i16(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).context("Failed to create WAV writer")?;
        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer
                .write_sample((clamped * i16::MAX as f32) as i16)
                .context("Failed to write WAV sample")?;
        }
        writer.finalize().context("Failed to finalize WAV data")?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_wav_header_and_size() {
        let samples = vec![0.0f32; 160];
        let bytes = encode_wav_i16(&samples, 16000).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        // 44-byte header plus two bytes per sample
        assert_eq!(bytes.len(), 44 + samples.len() * 2);
    }
}

//! Capture buffer for a single recording session.
//!
//! Accumulates mono sample frames at a fixed rate, classifying each full
//! frame as speech or silence so the session controller can evaluate its
//! stop conditions. The buffer is exclusively owned by its session until it
//! is moved into the transcription executor at stop.
//!
//! No hard upper bound is enforced on buffer size; growth is linear in
//! recording length, which is acceptable for human-speech-scale sessions.

use std::time::Duration;

use super::vad::EnergyVad;

/// Classification frame length. 30ms matches the granularity the silence
/// counter is configured in.
pub const FRAME_DURATION_MS: u64 = 30;

/// Accumulated audio for one recording session.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    pending: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    vad: EnergyVad,
    frame_samples: usize,
    /// Full frames to append without classification (activation-keystroke noise).
    warmup_frames: usize,
    silence_samples: usize,
    speech_detected: bool,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32, channels: u16, vad: EnergyVad) -> Self {
        let frame_samples = (sample_rate as u64 * FRAME_DURATION_MS / 1000).max(1) as usize;
        Self {
            samples: Vec::new(),
            pending: Vec::new(),
            sample_rate,
            channels,
            vad,
            frame_samples,
            warmup_frames: 0,
            silence_samples: 0,
            speech_detected: false,
        }
    }

    /// Skip VAD classification for the first `frames` full frames.
    pub fn with_warmup(mut self, frames: usize) -> Self {
        self.warmup_frames = frames;
        self
    }

    /// Append captured samples, classifying each completed frame.
    ///
    /// A speech frame resets the running silence counter; a silence frame
    /// extends it.
    pub fn push_samples(&mut self, incoming: &[f32]) {
        self.pending.extend_from_slice(incoming);
        while self.pending.len() >= self.frame_samples {
            let frame: Vec<f32> = self.pending.drain(..self.frame_samples).collect();
            self.samples.extend_from_slice(&frame);

            if self.warmup_frames > 0 {
                self.warmup_frames -= 1;
                continue;
            }

            if self.vad.is_speech(&frame) {
                self.speech_detected = true;
                self.silence_samples = 0;
            } else {
                self.silence_samples += frame.len();
            }
        }
    }

    /// Total accumulated duration.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Length of the current trailing silence run.
    pub fn silence_run(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.silence_samples as f64 / self.sample_rate as f64)
    }

    /// Whether any speech frame has been observed since the session started.
    pub fn speech_detected(&self) -> bool {
        self.speech_detected
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(buffer: &AudioBuffer, value: f32) -> Vec<f32> {
        vec![value; buffer_frame_len(buffer)]
    }

    fn buffer_frame_len(buffer: &AudioBuffer) -> usize {
        (buffer.sample_rate() as u64 * FRAME_DURATION_MS / 1000) as usize
    }

    fn test_buffer() -> AudioBuffer {
        AudioBuffer::new(16000, 1, EnergyVad::new(0.01))
    }

    #[test]
    fn test_duration_tracks_samples() {
        let mut buffer = test_buffer();
        // one second of audio in 30ms frames plus a partial remainder
        buffer.push_samples(&vec![0.0f32; 16000]);
        let duration = buffer.duration();
        assert!(duration >= Duration::from_millis(960));
        assert!(duration <= Duration::from_millis(1000));
    }

    #[test]
    fn test_silence_run_resets_on_speech() {
        let mut buffer = test_buffer();
        let silence = frame(&buffer, 0.0);
        let speech = frame(&buffer, 0.5);

        buffer.push_samples(&silence);
        buffer.push_samples(&silence);
        assert!(buffer.silence_run() >= Duration::from_millis(59));
        assert!(!buffer.speech_detected());

        buffer.push_samples(&speech);
        assert_eq!(buffer.silence_run(), Duration::ZERO);
        assert!(buffer.speech_detected());

        buffer.push_samples(&silence);
        assert!(buffer.silence_run() >= Duration::from_millis(29));
    }

    #[test]
    fn test_warmup_frames_skip_classification() {
        let mut buffer = test_buffer().with_warmup(2);
        let speech = frame(&buffer, 0.5);

        // the first two frames are loud but must not count as speech
        buffer.push_samples(&speech);
        buffer.push_samples(&speech);
        assert!(!buffer.speech_detected());

        buffer.push_samples(&speech);
        assert!(buffer.speech_detected());
    }

    #[test]
    fn test_partial_frames_stay_pending() {
        let mut buffer = test_buffer();
        let half = buffer_frame_len(&buffer) / 2;
        buffer.push_samples(&vec![0.5f32; half]);
        assert!(buffer.is_empty());
        assert!(!buffer.speech_detected());

        buffer.push_samples(&vec![0.5f32; half]);
        assert_eq!(buffer.len(), half * 2);
        assert!(buffer.speech_detected());
    }
}

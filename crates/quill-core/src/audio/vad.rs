//! Energy-based voice activity detection.
//!
//! Frames are classified as speech or silence by their short-time energy
//! (mean square of the samples) against a configurable threshold. This is
//! deliberately simple: no model files, no per-platform binaries, and cheap
//! enough to run on every captured frame.

/// Default speech-energy threshold for normalized f32 samples.
pub const DEFAULT_ENERGY_THRESHOLD: f32 = 1.0e-4;

/// Frame classifier used by the capture buffer.
#[derive(Debug, Clone, Copy)]
pub struct EnergyVad {
    threshold: f32,
}

impl EnergyVad {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Classify a frame as speech (true) or silence (false).
    pub fn is_speech(&self, frame: &[f32]) -> bool {
        short_time_energy(frame) >= self.threshold
    }
}

impl Default for EnergyVad {
    fn default() -> Self {
        Self::new(DEFAULT_ENERGY_THRESHOLD)
    }
}

/// Mean square of the frame samples. Empty frames have zero energy.
fn short_time_energy(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_below_threshold() {
        let vad = EnergyVad::new(0.01);
        let silence = vec![0.0f32; 480];
        assert!(!vad.is_speech(&silence));
    }

    #[test]
    fn test_speech_above_threshold() {
        let vad = EnergyVad::new(0.01);
        let speech = vec![0.5f32; 480];
        assert!(vad.is_speech(&speech));
    }

    #[test]
    fn test_empty_frame_is_silence() {
        let vad = EnergyVad::default();
        assert!(!vad.is_speech(&[]));
    }
}

//! Per-mode session state machine.
//!
//! The controller is pure: it receives activation edges and buffer
//! statistics and answers with the action the engine should take. All
//! capture, transcription and delivery side effects live in the engine.
//!
//! States: Idle → Arming → Recording → Stopping → Idle, with Aborted
//! reachable from any state on external cancel.

use std::time::Duration;

use crate::audio::AudioBuffer;
use crate::session::RecordingMode;

/// Lifecycle state of the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Arming,
    Recording,
    Stopping,
    Aborted,
}

/// Why a buffer is being discarded without transcription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    Aborted,
    ContinuousTimeout,
}

/// What the engine should do after feeding the controller an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    None,
    /// Open the capture stream and start accumulating.
    StartCapture,
    /// Hand the buffer to the executor; `rearm` restarts capture afterwards
    /// (continuous mode).
    Flush { rearm: bool },
    /// Drop the buffer without invoking the archiver.
    Discard(DiscardReason),
}

/// State machine for one engine, reused across sessions.
#[derive(Debug)]
pub struct SessionController {
    mode: RecordingMode,
    state: SessionState,
    /// Silence run that ends an utterance (VAD and continuous modes).
    silence_stop: Duration,
    /// Accumulated speechless time that force-stops continuous mode
    /// (zero = disabled).
    continuous_timeout: Duration,
}

impl SessionController {
    /// Apply the continuous-mode guard to the requested mode.
    ///
    /// Continuous capture streams indefinitely, so pairing it with a
    /// non-local provider requires the explicit allow flag. Without it the
    /// mode is refused and the session behaves as press-to-toggle; the
    /// returned message is the configuration error to report.
    pub fn resolve_mode(
        requested: RecordingMode,
        provider_is_local: bool,
        allow_remote_continuous: bool,
    ) -> (RecordingMode, Option<String>) {
        if requested == RecordingMode::Continuous
            && !provider_is_local
            && !allow_remote_continuous
        {
            return (
                RecordingMode::PressToToggle,
                Some(
                    "continuous mode with a non-local provider requires \
                     allow_remote_continuous; falling back to press_to_toggle"
                        .to_string(),
                ),
            );
        }
        (requested, None)
    }

    pub fn new(
        mode: RecordingMode,
        silence_stop: Duration,
        continuous_timeout: Duration,
    ) -> Self {
        Self {
            mode,
            state: SessionState::Idle,
            silence_stop,
            continuous_timeout,
        }
    }

    pub fn mode(&self) -> RecordingMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Press edge of an activation combo.
    pub fn on_activation_press(&mut self) -> ControlAction {
        match self.state {
            SessionState::Idle => {
                self.state = SessionState::Arming;
                ControlAction::StartCapture
            }
            SessionState::Recording => match self.mode {
                // duplicate press while holding is ignored
                RecordingMode::HoldToRecord => ControlAction::None,
                // toggle-style stop for every other mode
                _ => {
                    self.state = SessionState::Stopping;
                    ControlAction::Flush { rearm: false }
                }
            },
            _ => ControlAction::None,
        }
    }

    /// Release edge of an activation combo.
    pub fn on_activation_release(&mut self) -> ControlAction {
        if self.mode != RecordingMode::HoldToRecord {
            return ControlAction::None;
        }
        match self.state {
            // release before the stream opened still ends the session; the
            // min-duration check downstream discards anything too short
            SessionState::Arming | SessionState::Recording => {
                self.state = SessionState::Stopping;
                ControlAction::Flush { rearm: false }
            }
            _ => ControlAction::None,
        }
    }

    /// The capture stream is open and frames are flowing.
    pub fn on_capture_started(&mut self) {
        if self.state == SessionState::Arming {
            self.state = SessionState::Recording;
        }
    }

    /// Evaluate silence-based stop conditions after new frames landed.
    pub fn on_buffer_update(&mut self, buffer: &AudioBuffer) -> ControlAction {
        if self.state != SessionState::Recording {
            return ControlAction::None;
        }
        match self.mode {
            RecordingMode::PressToToggle | RecordingMode::HoldToRecord => ControlAction::None,
            RecordingMode::VoiceActivityDetection => {
                if buffer.speech_detected() && buffer.silence_run() >= self.silence_stop {
                    self.state = SessionState::Stopping;
                    ControlAction::Flush { rearm: false }
                } else {
                    ControlAction::None
                }
            }
            RecordingMode::Continuous => {
                if buffer.speech_detected() && buffer.silence_run() >= self.silence_stop {
                    self.state = SessionState::Stopping;
                    return ControlAction::Flush { rearm: true };
                }
                if !self.continuous_timeout.is_zero()
                    && !buffer.speech_detected()
                    && buffer.silence_run() >= self.continuous_timeout
                {
                    self.state = SessionState::Idle;
                    return ControlAction::Discard(DiscardReason::ContinuousTimeout);
                }
                ControlAction::None
            }
        }
    }

    /// The flushed buffer has been handed off.
    pub fn on_flush_complete(&mut self, rearm: bool) {
        self.state = if rearm {
            SessionState::Arming
        } else {
            SessionState::Idle
        };
    }

    /// External cancel: reachable from any state, discards the buffer
    /// without invoking the archiver.
    pub fn abort(&mut self) -> ControlAction {
        self.state = SessionState::Aborted;
        ControlAction::Discard(DiscardReason::Aborted)
    }

    /// Leave the Aborted terminal state and become available again.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioBuffer, EnergyVad, FRAME_DURATION_MS};

    const RATE: u32 = 16000;

    fn controller(mode: RecordingMode) -> SessionController {
        SessionController::new(
            mode,
            Duration::from_millis(900),
            Duration::from_secs(5),
        )
    }

    fn buffer() -> AudioBuffer {
        AudioBuffer::new(RATE, 1, EnergyVad::new(0.01))
    }

    fn push_speech(buffer: &mut AudioBuffer, ms: u64) {
        let samples = (RATE as u64 * ms / 1000) as usize;
        buffer.push_samples(&vec![0.5f32; samples]);
    }

    fn push_silence(buffer: &mut AudioBuffer, ms: u64) {
        let samples = (RATE as u64 * ms / 1000) as usize;
        buffer.push_samples(&vec![0.0f32; samples]);
    }

    #[test]
    fn test_toggle_starts_and_stops() {
        let mut ctl = controller(RecordingMode::PressToToggle);
        assert_eq!(ctl.on_activation_press(), ControlAction::StartCapture);
        assert_eq!(ctl.state(), SessionState::Arming);
        ctl.on_capture_started();
        assert_eq!(ctl.state(), SessionState::Recording);

        assert_eq!(
            ctl.on_activation_press(),
            ControlAction::Flush { rearm: false }
        );
        assert_eq!(ctl.state(), SessionState::Stopping);
        ctl.on_flush_complete(false);
        assert_eq!(ctl.state(), SessionState::Idle);
    }

    #[test]
    fn test_hold_ignores_duplicate_press_and_stops_on_release() {
        let mut ctl = controller(RecordingMode::HoldToRecord);
        ctl.on_activation_press();
        ctl.on_capture_started();

        assert_eq!(ctl.on_activation_press(), ControlAction::None);
        assert_eq!(ctl.state(), SessionState::Recording);

        assert_eq!(
            ctl.on_activation_release(),
            ControlAction::Flush { rearm: false }
        );
    }

    #[test]
    fn test_release_is_ignored_outside_hold_mode() {
        let mut ctl = controller(RecordingMode::PressToToggle);
        ctl.on_activation_press();
        ctl.on_capture_started();
        assert_eq!(ctl.on_activation_release(), ControlAction::None);
        assert_eq!(ctl.state(), SessionState::Recording);
    }

    #[test]
    fn test_vad_stops_after_speech_then_silence() {
        let mut ctl = controller(RecordingMode::VoiceActivityDetection);
        ctl.on_activation_press();
        ctl.on_capture_started();

        let mut buf = buffer();

        // silence before any speech must not stop the session
        push_silence(&mut buf, 1200);
        assert_eq!(ctl.on_buffer_update(&buf), ControlAction::None);

        push_speech(&mut buf, 300);
        assert_eq!(ctl.on_buffer_update(&buf), ControlAction::None);

        push_silence(&mut buf, 930);
        assert_eq!(
            ctl.on_buffer_update(&buf),
            ControlAction::Flush { rearm: false }
        );
    }

    #[test]
    fn test_continuous_flushes_and_rearms_on_pause() {
        let mut ctl = controller(RecordingMode::Continuous);
        ctl.on_activation_press();
        ctl.on_capture_started();

        let mut buf = buffer();
        push_speech(&mut buf, 300);
        push_silence(&mut buf, 930);
        assert_eq!(
            ctl.on_buffer_update(&buf),
            ControlAction::Flush { rearm: true }
        );
        ctl.on_flush_complete(true);
        assert_eq!(ctl.state(), SessionState::Arming);
        ctl.on_capture_started();
        assert_eq!(ctl.state(), SessionState::Recording);
    }

    #[test]
    fn test_continuous_second_press_full_stops() {
        let mut ctl = controller(RecordingMode::Continuous);
        ctl.on_activation_press();
        ctl.on_capture_started();
        assert_eq!(
            ctl.on_activation_press(),
            ControlAction::Flush { rearm: false }
        );
    }

    #[test]
    fn test_continuous_timeout_discards_without_flush() {
        let mut ctl = controller(RecordingMode::Continuous);
        ctl.on_activation_press();
        ctl.on_capture_started();

        let mut buf = buffer();
        push_silence(&mut buf, 5100);
        assert_eq!(
            ctl.on_buffer_update(&buf),
            ControlAction::Discard(DiscardReason::ContinuousTimeout)
        );
        assert_eq!(ctl.state(), SessionState::Idle);
    }

    #[test]
    fn test_zero_timeout_disables_continuous_timeout() {
        let mut ctl = SessionController::new(
            RecordingMode::Continuous,
            Duration::from_millis(900),
            Duration::ZERO,
        );
        ctl.on_activation_press();
        ctl.on_capture_started();

        let mut buf = buffer();
        push_silence(&mut buf, 20_000);
        assert_eq!(ctl.on_buffer_update(&buf), ControlAction::None);
    }

    #[test]
    fn test_abort_from_any_state() {
        for mode in [
            RecordingMode::PressToToggle,
            RecordingMode::HoldToRecord,
            RecordingMode::VoiceActivityDetection,
            RecordingMode::Continuous,
        ] {
            let mut ctl = controller(mode);
            ctl.on_activation_press();
            ctl.on_capture_started();
            assert_eq!(ctl.abort(), ControlAction::Discard(DiscardReason::Aborted));
            assert_eq!(ctl.state(), SessionState::Aborted);
            ctl.reset();
            assert_eq!(ctl.state(), SessionState::Idle);
        }
    }

    #[test]
    fn test_remote_continuous_without_flag_downgrades() {
        let (mode, error) =
            SessionController::resolve_mode(RecordingMode::Continuous, false, false);
        assert_eq!(mode, RecordingMode::PressToToggle);
        assert!(error.is_some());
    }

    #[test]
    fn test_remote_continuous_with_flag_is_allowed() {
        let (mode, error) = SessionController::resolve_mode(RecordingMode::Continuous, false, true);
        assert_eq!(mode, RecordingMode::Continuous);
        assert!(error.is_none());
    }

    #[test]
    fn test_local_continuous_needs_no_flag() {
        let (mode, error) = SessionController::resolve_mode(RecordingMode::Continuous, true, false);
        assert_eq!(mode, RecordingMode::Continuous);
        assert!(error.is_none());
    }

    #[test]
    fn test_silence_threshold_boundary_is_inclusive() {
        let mut ctl = SessionController::new(
            RecordingMode::VoiceActivityDetection,
            Duration::from_millis(FRAME_DURATION_MS * 2),
            Duration::ZERO,
        );
        ctl.on_activation_press();
        ctl.on_capture_started();

        let mut buf = buffer();
        push_speech(&mut buf, FRAME_DURATION_MS);
        push_silence(&mut buf, FRAME_DURATION_MS * 2);
        assert_eq!(
            ctl.on_buffer_update(&buf),
            ControlAction::Flush { rearm: false }
        );
    }
}

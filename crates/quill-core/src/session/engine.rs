//! Background session engine.
//!
//! One worker thread drives capture accumulation, controller transitions and
//! the transcription executor, so the thread feeding key events never blocks
//! on audio or network calls. Commands arrive over a channel; outcomes leave
//! over another. Buffers are owned by exactly one side at a time: the worker
//! builds them, and moves them into the executor or the archiver.
//!
//! Cancellation is generation-based. Aborting bumps a shared counter; any
//! result computed for an older generation is dropped on arrival instead of
//! being delivered, so a late provider response can never touch a newer
//! session's state.

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use crate::archive::archive_failed_audio;
use crate::audio::{AudioBuffer, AudioRecorder, EnergyVad, FRAME_DURATION_MS, RecorderConfig};
use crate::output::{DeliveryMethod, delivery_method};
use crate::rewrite::apply_pipeline;
use crate::session::{
    ActivationKind, ControlAction, DiscardReason, Edge, KeyEvent, RecordingSession, SessionConfig,
    SessionController,
};
use crate::transcription::{LlmMode, execute, post_process};

/// Capture frames to drop at session start (activation-keystroke noise).
const WARMUP_MS: u64 = 150;

/// Commands accepted by the engine worker.
#[derive(Debug)]
pub enum EngineCommand {
    Key(KeyEvent),
    /// Clean supplied text directly (clipboard-cleanup), no recording.
    CleanupText(String),
    Abort,
    Shutdown,
}

/// Outcomes handed back to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Transcribed {
        text: String,
        delivery: DeliveryMethod,
    },
    /// Retry exhaustion; the status line already includes the archiver outcome.
    Failed { status: String },
    Discarded { reason: String },
    ConfigError { message: String },
}

/// Handle owned by the host; drives the worker thread.
pub struct EngineHandle {
    cmd_tx: Sender<EngineCommand>,
    generation: Arc<AtomicU64>,
    join: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub fn send_key(&self, event: KeyEvent) {
        let _ = self.cmd_tx.send(EngineCommand::Key(event));
    }

    pub fn cleanup_text(&self, text: String) {
        let _ = self.cmd_tx.send(EngineCommand::CleanupText(text));
    }

    /// Cancel whatever is in flight. The current session's eventual result
    /// is dropped, not awaited.
    pub fn abort(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let _ = self.cmd_tx.send(EngineCommand::Abort);
    }

    /// Stop the worker and wait for it to exit.
    pub fn shutdown(mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Spawn the engine worker for one immutable config snapshot.
pub fn spawn(config: Arc<SessionConfig>, outcome_tx: Sender<SessionOutcome>) -> EngineHandle {
    let (cmd_tx, cmd_rx) = unbounded();
    let generation = Arc::new(AtomicU64::new(0));
    let worker_generation = Arc::clone(&generation);

    let join = std::thread::Builder::new()
        .name("quill-session".to_string())
        .spawn(move || run_worker(config, cmd_rx, outcome_tx, worker_generation))
        .ok();

    EngineHandle {
        cmd_tx,
        generation,
        join,
    }
}

fn run_worker(
    config: Arc<SessionConfig>,
    cmd_rx: Receiver<EngineCommand>,
    outcome_tx: Sender<SessionOutcome>,
    generation: Arc<AtomicU64>,
) {
    if let Some(message) = &config.config_error {
        eprintln!("Configuration error: {message}");
        let _ = outcome_tx.send(SessionOutcome::ConfigError {
            message: message.clone(),
        });
    }

    let mut controller = SessionController::new(
        config.mode,
        config.silence_stop,
        config.continuous_timeout,
    );

    loop {
        let Ok(command) = cmd_rx.recv() else {
            return;
        };
        match command {
            EngineCommand::Key(event) => {
                if event.edge != Edge::Press {
                    continue;
                }
                let Some(kind) = config.activation_kind(&event.combo) else {
                    continue;
                };
                if kind == ActivationKind::TextCleanup {
                    // the clipboard payload travels with CleanupText instead
                    continue;
                }
                if controller.on_activation_press() != ControlAction::StartCapture {
                    continue;
                }
                let done = run_session(
                    &config,
                    &mut controller,
                    &cmd_rx,
                    &outcome_tx,
                    &generation,
                    &event.combo,
                    kind.llm_mode(),
                );
                controller.reset();
                if done {
                    return;
                }
            }
            EngineCommand::CleanupText(text) => {
                run_text_cleanup(&config, &outcome_tx, &generation, text);
            }
            EngineCommand::Abort => {
                // nothing active; the generation bump already happened
                controller.reset();
            }
            EngineCommand::Shutdown => return,
        }
    }
}

/// Clipboard-cleanup: Stage B directly on the supplied text, no find/replace.
fn run_text_cleanup(
    config: &SessionConfig,
    outcome_tx: &Sender<SessionOutcome>,
    generation: &AtomicU64,
    text: String,
) {
    let session_generation = generation.load(Ordering::SeqCst);
    let cleaned = match &config.post_processing {
        Some(post) => post_process(&text, LlmMode::ClipboardCleanup, post),
        None => {
            let _ = outcome_tx.send(SessionOutcome::Discarded {
                reason: "post-processing is not configured".to_string(),
            });
            return;
        }
    };
    if generation.load(Ordering::SeqCst) != session_generation {
        crate::verbose!("Dropping stale cleanup result");
        return;
    }
    let delivery = delivery_method(&cleaned, config.clipboard_threshold);
    let _ = outcome_tx.send(SessionOutcome::Transcribed {
        text: cleaned,
        delivery,
    });
}

/// Drive one session from capture start to its mode-defined end.
///
/// Returns true when the worker should shut down.
fn run_session(
    config: &SessionConfig,
    controller: &mut SessionController,
    cmd_rx: &Receiver<EngineCommand>,
    outcome_tx: &Sender<SessionOutcome>,
    generation: &AtomicU64,
    activation_key: &str,
    llm: Option<LlmMode>,
) -> bool {
    let session_generation = generation.load(Ordering::SeqCst);
    let recorder_config = RecorderConfig {
        device_name: config.sound_device.clone(),
    };

    // continuous mode loops here, re-arming after each flushed utterance
    loop {
        let (frame_tx, frame_rx) = bounded::<Vec<f32>>(64);
        let recorder = match AudioRecorder::start(&recorder_config, frame_tx) {
            Ok(recorder) => recorder,
            Err(e) => {
                controller.abort();
                let _ = outcome_tx.send(SessionOutcome::Failed {
                    status: format!("could not start capture: {e}"),
                });
                return false;
            }
        };
        let sample_rate = recorder.sample_rate();
        let warmup_frames = (WARMUP_MS / FRAME_DURATION_MS) as usize;
        let mut session = RecordingSession::new(
            controller.mode(),
            activation_key.to_string(),
            llm,
            AudioBuffer::new(sample_rate, 1, EnergyVad::new(config.silence_threshold))
                .with_warmup(warmup_frames),
        );
        controller.on_capture_started();
        session.state = controller.state();
        crate::verbose!("Recording at {sample_rate}Hz ({})", controller.mode());

        // capture loop: frames and commands race; neither side blocks long
        let rearm = loop {
            crossbeam_channel::select! {
                recv(frame_rx) -> frame => {
                    let Ok(frame) = frame else { break None; };
                    session.buffer.push_samples(&frame);
                    match controller.on_buffer_update(&session.buffer) {
                        ControlAction::Flush { rearm } => break Some(rearm),
                        ControlAction::Discard(DiscardReason::ContinuousTimeout) => {
                            recorder.stop();
                            let _ = outcome_tx.send(SessionOutcome::Discarded {
                                reason: "no speech before continuous timeout".to_string(),
                            });
                            return false;
                        }
                        _ => {}
                    }
                }
                recv(cmd_rx) -> command => {
                    match command {
                        Ok(EngineCommand::Key(event)) => {
                            if config.activation_kind(&event.combo).is_some() {
                                let action = match event.edge {
                                    Edge::Press => controller.on_activation_press(),
                                    Edge::Release => controller.on_activation_release(),
                                };
                                if let ControlAction::Flush { rearm } = action {
                                    break Some(rearm);
                                }
                            }
                        }
                        Ok(EngineCommand::CleanupText(text)) => {
                            run_text_cleanup(config, outcome_tx, generation, text);
                        }
                        Ok(EngineCommand::Abort) => {
                            controller.abort();
                            recorder.stop();
                            // buffer dropped; the archiver is not invoked
                            let _ = outcome_tx.send(SessionOutcome::Discarded {
                                reason: "aborted".to_string(),
                            });
                            return false;
                        }
                        Ok(EngineCommand::Shutdown) | Err(_) => {
                            recorder.stop();
                            return true;
                        }
                    }
                }
            }
            session.state = controller.state();
        };

        recorder.stop();

        let Some(rearm) = rearm else {
            // capture stream ended unexpectedly
            let _ = outcome_tx.send(SessionOutcome::Failed {
                status: "capture stream closed unexpectedly".to_string(),
            });
            return false;
        };

        if !meets_minimum_duration(&session.buffer, config.min_duration) {
            crate::verbose!(
                "Discarding {:.0}ms recording (below minimum)",
                session.buffer.duration().as_secs_f64() * 1000.0
            );
            let _ = outcome_tx.send(SessionOutcome::Discarded {
                reason: "recording too short".to_string(),
            });
            return false;
        }

        // buffer ownership moves out of the session here
        let buffer = session.buffer;
        match execute(&buffer, &config.adapters, &config.executor) {
            Ok(result) => {
                let mut text =
                    apply_pipeline(&result.text, &config.rules, &config.rewrite_options);
                if let (Some(mode), Some(post)) = (llm, &config.post_processing) {
                    text = post_process(&text, mode, post);
                }
                if generation.load(Ordering::SeqCst) != session_generation {
                    crate::verbose!("Dropping stale transcription result");
                    return false;
                }
                let delivery = delivery_method(&text, config.clipboard_threshold);
                let _ = outcome_tx.send(SessionOutcome::Transcribed { text, delivery });
            }
            Err(exhausted) => {
                let archive = archive_failed_audio(Some(&buffer), &config.data_root);
                if generation.load(Ordering::SeqCst) != session_generation {
                    crate::verbose!("Dropping stale transcription failure");
                    return false;
                }
                let _ = outcome_tx.send(SessionOutcome::Failed {
                    status: format!(
                        "All {} transcription attempts failed. {}",
                        exhausted.attempts.len(),
                        archive.status_line()
                    ),
                });
            }
        }

        controller.on_flush_complete(rearm);
        if !rearm {
            return false;
        }
    }
}

/// Gate between capture and transcription: buffers below the configured
/// minimum are discarded and the executor is never invoked for them.
fn meets_minimum_duration(buffer: &AudioBuffer, min_duration: std::time::Duration) -> bool {
    buffer.duration() >= min_duration
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_short_buffers_never_reach_the_executor() {
        let mut buffer = AudioBuffer::new(16000, 1, EnergyVad::default());
        buffer.push_samples(&vec![0.1f32; 800]); // 50ms
        assert!(!meets_minimum_duration(&buffer, Duration::from_millis(100)));

        buffer.push_samples(&vec![0.1f32; 3200]); // now 250ms
        assert!(meets_minimum_duration(&buffer, Duration::from_millis(100)));
    }
}

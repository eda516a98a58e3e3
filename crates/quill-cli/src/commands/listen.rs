//! The listen command: wire the session engine to the terminal.
//!
//! The terminal thread only reads key events and forwards them; every
//! blocking operation (capture, providers, archiving) happens on the
//! engine's worker thread. Outcomes are printed from a third thread so a
//! slow transcription never delays key handling.

use anyhow::{Context, Result};
use crossbeam_channel::unbounded;
use crossterm::event::{
    Event, KeyCode, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use std::sync::Arc;
use std::thread;

use quill_core::output::OutputSink;
use quill_core::session::{self, SessionOutcome};
use quill_core::{ClipboardSink, DeliveryMethod, SessionConfig, Settings};

use crate::app;

pub fn run() -> Result<()> {
    let settings = Settings::load();
    let config = Arc::new(SessionConfig::snapshot(&settings)?);
    let text_cleanup_combo = config.keys.text_cleanup.clone();

    let (outcome_tx, outcome_rx) = unbounded();
    let handle = session::spawn(Arc::clone(&config), outcome_tx);

    // outcome printer; also owns the clipboard sink for paste delivery
    let printer = thread::spawn(move || {
        let mut sink = ClipboardSink::new().ok();
        for outcome in outcome_rx {
            match outcome {
                SessionOutcome::Transcribed { text, delivery } => {
                    println!("\r{text}");
                    if delivery == DeliveryMethod::ClipboardPaste {
                        match sink.as_mut().map(|s| s.deliver(&text, delivery)) {
                            Some(Ok(())) => eprintln!("(long text copied to clipboard)"),
                            Some(Err(e)) => eprintln!("(clipboard delivery failed: {e})"),
                            None => eprintln!("(clipboard unavailable)"),
                        }
                    }
                }
                SessionOutcome::Failed { status } => eprintln!("\r{status}"),
                SessionOutcome::Discarded { reason } => eprintln!("\r(discarded: {reason})"),
                SessionOutcome::ConfigError { message } => {
                    eprintln!("\rconfiguration error: {message}")
                }
            }
        }
    });

    app::print_banner(config.mode.as_str());

    enable_raw_mode().context("Failed to enable raw terminal mode")?;
    // key-release events (hold-to-record) need the enhancement protocol
    let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        let _ = execute!(
            std::io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );
    }

    let result = key_loop(&handle, text_cleanup_combo.as_deref());

    if enhanced {
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode().ok();

    handle.shutdown();
    let _ = printer.join();

    result
}

fn key_loop(handle: &session::EngineHandle, text_cleanup_combo: Option<&str>) -> Result<()> {
    loop {
        let Event::Key(event) = crossterm::event::read().context("Failed to read key event")?
        else {
            continue;
        };

        if event.code == KeyCode::Char('q') {
            return Ok(());
        }
        if event.code == KeyCode::Esc {
            handle.abort();
            continue;
        }

        let Some(key_event) = app::map_key_event(&event) else {
            continue;
        };

        // the clipboard payload must be read on this side; the engine only
        // ever sees text, never the clipboard itself
        if Some(key_event.combo.as_str()) == text_cleanup_combo
            && key_event.edge == quill_core::Edge::Press
        {
            match app::read_clipboard() {
                Ok(text) => handle.cleanup_text(text),
                Err(e) => eprintln!("\r(clipboard cleanup skipped: {e})"),
            }
            continue;
        }

        handle.send_key(key_event);
    }
}

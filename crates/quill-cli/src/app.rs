//! Shared CLI helpers.

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent as TermKeyEvent, KeyEventKind};
use quill_core::{Edge, KeyEvent};

/// Read the current clipboard text (for clipboard-cleanup).
pub fn read_clipboard() -> Result<String> {
    let mut clipboard = arboard::Clipboard::new().context("Failed to access clipboard")?;
    clipboard.get_text().context("Clipboard has no text")
}

/// Map a terminal key event to the engine's (combo, edge) form.
///
/// Terminal input has no global hotkeys; function keys and plain characters
/// stand in for the configured combos. Key-release events are only delivered
/// on terminals that support the keyboard enhancement protocol; hold-to-record
/// needs one of those.
pub fn map_key_event(event: &TermKeyEvent) -> Option<KeyEvent> {
    let combo = match event.code {
        KeyCode::F(n) => format!("f{n}"),
        KeyCode::Char(c) => c.to_lowercase().to_string(),
        _ => return None,
    };
    let edge = match event.kind {
        KeyEventKind::Press => Edge::Press,
        KeyEventKind::Release => Edge::Release,
        KeyEventKind::Repeat => return None,
    };
    Some(KeyEvent { combo, edge })
}

pub fn print_banner(mode: &str) {
    println!("quill is listening ({mode} mode)");
    println!("  f9  dictate    f10 dictate + cleanup    f11 dictate + instruction");
    println!("  f12 clean clipboard text    esc abort    q quit");
}

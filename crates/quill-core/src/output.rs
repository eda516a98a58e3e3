//! Delivery of final text to the output sink.
//!
//! The pipeline does not type or paste by itself; it hands the final text
//! plus a delivery-method hint to whatever sink the host wires in. The hint
//! is chosen by a character-count threshold: short text is cheap to deliver
//! as simulated keystrokes, long text is pasted through the clipboard.

use anyhow::Result;

/// How the sink should deliver the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMethod {
    Keystrokes,
    ClipboardPaste,
}

/// Pick the delivery method for `text` given the configured threshold.
pub fn delivery_method(text: &str, clipboard_threshold: usize) -> DeliveryMethod {
    if text.chars().count() > clipboard_threshold {
        DeliveryMethod::ClipboardPaste
    } else {
        DeliveryMethod::Keystrokes
    }
}

/// Receives final text from the session engine.
pub trait OutputSink: Send {
    fn deliver(&mut self, text: &str, method: DeliveryMethod) -> Result<()>;
}

#[cfg(feature = "clipboard")]
pub use clipboard_sink::ClipboardSink;

#[cfg(feature = "clipboard")]
mod clipboard_sink {
    use super::{DeliveryMethod, OutputSink};
    use anyhow::{Context, Result};
    use arboard::Clipboard;

    /// Sink that copies text to the system clipboard.
    ///
    /// Used for the paste delivery method; hosts that can simulate
    /// keystrokes provide their own sink for short text.
    pub struct ClipboardSink {
        clipboard: Clipboard,
    }

    impl ClipboardSink {
        pub fn new() -> Result<Self> {
            let clipboard = Clipboard::new().context("Failed to access clipboard")?;
            Ok(Self { clipboard })
        }
    }

    impl OutputSink for ClipboardSink {
        fn deliver(&mut self, text: &str, _method: DeliveryMethod) -> Result<()> {
            self.clipboard
                .set_text(text)
                .context("Failed to copy text to clipboard")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_uses_keystrokes() {
        assert_eq!(delivery_method("hello", 1000), DeliveryMethod::Keystrokes);
    }

    #[test]
    fn test_long_text_uses_clipboard() {
        let long = "x".repeat(1001);
        assert_eq!(delivery_method(&long, 1000), DeliveryMethod::ClipboardPaste);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let exact = "x".repeat(1000);
        assert_eq!(delivery_method(&exact, 1000), DeliveryMethod::Keystrokes);
    }
}

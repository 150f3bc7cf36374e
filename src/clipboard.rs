//! Clipboard adapter with a transient "copied" flag

use std::time::{Duration, Instant};
use tracing::debug;

/// Destination for copied text
pub trait ClipboardSink {
    fn write_text(&self, text: &str);
}

impl ClipboardSink for egui::Context {
    fn write_text(&self, text: &str) {
        self.copy_text(text.to_string());
    }
}

/// Tracks when text was last copied so the view can show "Copied!"
#[derive(Debug, Clone)]
pub struct ClipboardState {
    success_duration: Duration,
    copied_at: Option<Instant>,
}

impl ClipboardState {
    pub fn new(success_duration: Duration) -> Self {
        Self {
            success_duration,
            copied_at: None,
        }
    }

    /// Write `text` through `sink` and raise the copied flag
    pub fn copy(&mut self, sink: &dyn ClipboardSink, text: &str, now: Instant) {
        sink.write_text(text);
        self.copied_at = Some(now);
        debug!("Copied {} chars to clipboard", text.len());
    }

    /// Whether the copied flag is still raised at `now`
    pub fn is_copied(&self, now: Instant) -> bool {
        self.copied_at
            .map(|at| now.saturating_duration_since(at) < self.success_duration)
            .unwrap_or(false)
    }

    /// Time left until the flag drops, if it is raised
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let at = self.copied_at?;
        self.success_duration
            .checked_sub(now.saturating_duration_since(at))
            .filter(|d| !d.is_zero())
    }

    pub fn success_duration(&self) -> Duration {
        self.success_duration
    }
}

impl Default for ClipboardState {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        written: RefCell<Vec<String>>,
    }

    impl ClipboardSink for RecordingSink {
        fn write_text(&self, text: &str) {
            self.written.borrow_mut().push(text.to_string());
        }
    }

    #[test]
    fn test_copied_flag_lifecycle() {
        let sink = RecordingSink::default();
        let mut clipboard = ClipboardState::new(Duration::from_millis(1000));
        let start = Instant::now();

        assert!(!clipboard.is_copied(start));

        clipboard.copy(&sink, "hello", start);
        assert!(clipboard.is_copied(start));
        assert!(clipboard.is_copied(start + Duration::from_millis(999)));
        assert!(!clipboard.is_copied(start + Duration::from_millis(1000)));
        assert_eq!(*sink.written.borrow(), vec!["hello".to_string()]);
    }

    #[test]
    fn test_remaining_counts_down() {
        let sink = RecordingSink::default();
        let mut clipboard = ClipboardState::default();
        let start = Instant::now();

        assert_eq!(clipboard.remaining(start), None);

        clipboard.copy(&sink, "x", start);
        assert_eq!(
            clipboard.remaining(start + Duration::from_millis(400)),
            Some(Duration::from_millis(600))
        );
        assert_eq!(clipboard.remaining(start + Duration::from_secs(2)), None);
    }

    #[test]
    fn test_copy_again_restarts_timer() {
        let sink = RecordingSink::default();
        let mut clipboard = ClipboardState::new(Duration::from_millis(100));
        let start = Instant::now();

        clipboard.copy(&sink, "a", start);
        clipboard.copy(&sink, "b", start + Duration::from_millis(90));
        assert!(clipboard.is_copied(start + Duration::from_millis(150)));
        assert_eq!(sink.written.borrow().len(), 2);
    }
}

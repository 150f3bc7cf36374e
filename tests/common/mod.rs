//! Test doubles shared by the integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use voicechat::speech::{ListenOptions, Speaker, Transcriber};
use voicechat::ui::AppState;

/// Recognizer driven by the test instead of a microphone
#[derive(Clone, Default)]
pub struct ScriptedTranscriber {
    pub transcript: Arc<Mutex<String>>,
    pub listening: Arc<AtomicBool>,
    pub resets: Arc<AtomicUsize>,
    pub last_options: Arc<Mutex<Option<(bool, String)>>>,
    /// Keep recognizing after `stop` until `finish` is called
    pub slow_final_pass: Arc<AtomicBool>,
    pub finishing: Arc<AtomicBool>,
}

impl ScriptedTranscriber {
    /// Pretend the recognizer heard `text` so far
    pub fn hear(&self, text: &str) {
        *self.transcript.lock() = text.to_string();
    }

    /// Deliver the last words of a stopped session
    pub fn finish(&self, text: &str) {
        self.hear(text);
        self.finishing.store(false, Ordering::SeqCst);
    }

    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl Transcriber for ScriptedTranscriber {
    fn is_supported(&self) -> bool {
        true
    }

    fn start(&mut self, options: &ListenOptions) -> voicechat::Result<()> {
        *self.last_options.lock() = Some((options.continuous, options.locale.clone()));
        self.listening.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.listening.store(false, Ordering::SeqCst);
        self.finishing
            .store(self.slow_final_pass.load(Ordering::SeqCst), Ordering::SeqCst);
    }

    fn reset(&mut self) {
        self.transcript.lock().clear();
        self.resets.fetch_add(1, Ordering::SeqCst);
    }

    fn transcript(&self) -> String {
        self.transcript.lock().clone()
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    fn is_busy(&self) -> bool {
        self.is_listening() || self.finishing.load(Ordering::SeqCst)
    }
}

/// Speaker that remembers what it was asked to say
#[derive(Clone, Default)]
pub struct RecordingSpeaker {
    pub spoken: Arc<Mutex<Vec<String>>>,
}

impl RecordingSpeaker {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&self, text: &str) {
        self.spoken.lock().push(text.to_string());
    }
}

/// State with a scripted recognizer and a recording speaker
pub fn scripted_state() -> (AppState, ScriptedTranscriber, RecordingSpeaker) {
    let transcriber = ScriptedTranscriber::default();
    let speaker = RecordingSpeaker::default();
    let state = AppState::new(Box::new(transcriber.clone())).with_speaker(Box::new(speaker.clone()));
    (state, transcriber, speaker)
}

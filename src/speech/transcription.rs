//! Speech-to-text adapter
//!
//! The view only ever talks to a [`Transcriber`]: start, stop, reset and a
//! live transcript string that it mirrors into the input field.

use crate::config::SpeechConfig;
use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::error;

/// How a listening session should behave
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenOptions {
    /// Keep listening until stopped explicitly
    pub continuous: bool,
    /// BCP 47 locale, e.g. `en-IN`
    pub locale: String,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            continuous: true,
            locale: "en-IN".to_string(),
        }
    }
}

impl From<&SpeechConfig> for ListenOptions {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            continuous: config.continuous,
            locale: config.locale.clone(),
        }
    }
}

/// Live speech recognition as seen by the view
pub trait Transcriber {
    /// Whether recognition can work at all on this system
    fn is_supported(&self) -> bool;

    fn start(&mut self, options: &ListenOptions) -> Result<()>;

    fn stop(&mut self);

    /// Forget the transcript heard so far
    fn reset(&mut self);

    fn transcript(&self) -> String;

    fn is_listening(&self) -> bool;

    /// Recognition is still producing text, including the final pass after `stop`
    fn is_busy(&self) -> bool {
        self.is_listening()
    }
}

/// Stand-in used when no recognizer could be created
pub struct UnsupportedTranscriber {
    reason: String,
}

impl UnsupportedTranscriber {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Transcriber for UnsupportedTranscriber {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(&mut self, _options: &ListenOptions) -> Result<()> {
        Err(crate::VoiceChatError::SpeechUnsupported(self.reason.clone()))
    }

    fn stop(&mut self) {}

    fn reset(&mut self) {}

    fn transcript(&self) -> String {
        String::new()
    }

    fn is_listening(&self) -> bool {
        false
    }
}

/// Transcript shared between the recognition worker and the UI thread.
///
/// Every reset bumps the generation; text published under an older
/// generation is dropped so late results cannot resurrect a cleared field.
#[derive(Debug, Default)]
pub struct LiveTranscript {
    text: String,
    generation: u64,
}

pub type SharedTranscript = Arc<Mutex<LiveTranscript>>;

impl LiveTranscript {
    pub fn shared() -> SharedTranscript {
        Arc::new(Mutex::new(Self::default()))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Clear the text and start a new generation
    pub fn reset(&mut self) -> u64 {
        self.text.clear();
        self.generation += 1;
        self.generation
    }

    /// Publish text produced under `generation`; returns false if stale
    pub fn publish(&mut self, generation: u64, text: String) -> bool {
        if generation != self.generation {
            return false;
        }
        self.text = text;
        true
    }
}

/// What happened after feeding audio into a [`TranscriptBuffer`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BufferOutcome {
    /// The transcript text changed
    pub updated: bool,
    /// A non-continuous session has heard enough and is over
    pub finished: bool,
}

/// Accumulates mono audio and decides when to re-run recognition.
///
/// The whole current segment is recognized again every `update_interval`
/// samples so the transcript grows while the user speaks. Segments longer
/// than `max_segment` are committed and a fresh one begins.
pub struct TranscriptBuffer {
    update_interval: usize,
    max_segment: usize,
    single_shot: Option<usize>,

    committed: String,
    current: String,
    segment: Vec<f32>,
    since_update: usize,
    heard: usize,
}

impl TranscriptBuffer {
    /// Sizes are in samples at the capture rate
    pub fn new(update_interval: usize, max_segment: usize, single_shot: Option<usize>) -> Self {
        Self {
            update_interval: update_interval.max(1),
            max_segment: max_segment.max(1),
            single_shot,
            committed: String::new(),
            current: String::new(),
            segment: Vec::new(),
            since_update: 0,
            heard: 0,
        }
    }

    /// Build a buffer for a capture rate and listening mode
    pub fn for_session(config: &SpeechConfig, sample_rate: u32, continuous: bool) -> Self {
        let samples = |secs: f32| (secs.max(0.0) * sample_rate as f32) as usize;
        let update_interval = (config.update_interval_ms as usize * sample_rate as usize) / 1000;
        let single_shot = (!continuous).then(|| samples(config.single_shot_secs));
        Self::new(update_interval, samples(config.max_segment_secs), single_shot)
    }

    pub fn transcript(&self) -> String {
        match (self.committed.is_empty(), self.current.is_empty()) {
            (true, _) => self.current.clone(),
            (false, true) => self.committed.clone(),
            (false, false) => format!("{} {}", self.committed, self.current),
        }
    }

    /// Feed captured audio, running `recognize` when a refresh is due
    pub fn push<F>(&mut self, samples: &[f32], mut recognize: F) -> Result<BufferOutcome>
    where
        F: FnMut(&[f32]) -> Result<String>,
    {
        self.segment.extend_from_slice(samples);
        self.since_update += samples.len();
        self.heard += samples.len();

        let mut outcome = BufferOutcome::default();

        if let Some(limit) = self.single_shot {
            if self.heard >= limit {
                outcome.updated = self.refresh(&mut recognize)?;
                outcome.finished = true;
                return Ok(outcome);
            }
        }

        if self.segment.len() >= self.max_segment {
            outcome.updated = self.refresh(&mut recognize)?;
            self.commit();
        } else if self.since_update >= self.update_interval {
            outcome.updated = self.refresh(&mut recognize)?;
        }

        Ok(outcome)
    }

    /// Recognize whatever is left in the segment
    pub fn flush<F>(&mut self, mut recognize: F) -> Result<bool>
    where
        F: FnMut(&[f32]) -> Result<String>,
    {
        if self.segment.is_empty() || self.since_update == 0 {
            return Ok(false);
        }
        self.refresh(&mut recognize)
    }

    /// Drop audio and text
    pub fn clear(&mut self) {
        self.committed.clear();
        self.current.clear();
        self.segment.clear();
        self.since_update = 0;
        self.heard = 0;
    }

    fn refresh<F>(&mut self, recognize: &mut F) -> Result<bool>
    where
        F: FnMut(&[f32]) -> Result<String>,
    {
        self.since_update = 0;
        if self.segment.is_empty() {
            return Ok(false);
        }
        let text = recognize(&self.segment)?.trim().to_string();
        let changed = text != self.current;
        self.current = text;
        Ok(changed)
    }

    fn commit(&mut self) {
        if !self.current.is_empty() {
            if !self.committed.is_empty() {
                self.committed.push(' ');
            }
            self.committed.push_str(&self.current);
        }
        self.current.clear();
        self.segment.clear();
        self.since_update = 0;
    }
}

/// Create the best recognizer available, or an unsupported stand-in
pub fn create_transcriber(config: &SpeechConfig) -> Box<dyn Transcriber> {
    #[cfg(feature = "audio-io")]
    {
        match super::whisper::WhisperTranscriber::new(config.clone()) {
            Ok(transcriber) => Box::new(transcriber),
            Err(e) => {
                error!("Speech recognition unavailable: {}", e);
                Box::new(UnsupportedTranscriber::new(e.to_string()))
            }
        }
    }

    #[cfg(not(feature = "audio-io"))]
    {
        let _ = config;
        let reason = "built without the audio-io feature";
        error!("Speech recognition unavailable: {}", reason);
        Box::new(UnsupportedTranscriber::new(reason))
    }
}

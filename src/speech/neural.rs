//! Neural voice using sherpa-rs VITS models, played through rodio

use super::synthesis::SpeechBackend;
use crate::config::SpeechConfig;
use crate::{Result, VoiceChatError};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use sherpa_rs::tts::{VitsTts, VitsTtsConfig};
use std::path::Path;
use tracing::{debug, info};

pub struct NeuralVoice {
    tts: VitsTts,
    speaker_id: i32,
    // The stream must outlive every sink created from its handle
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl NeuralVoice {
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        for (label, path) in [
            ("Model", &config.tts_model_path),
            ("Tokens file", &config.tts_tokens_path),
        ] {
            if !Path::new(path).exists() {
                return Err(VoiceChatError::ModelLoadError(format!(
                    "{} not found: {}",
                    label, path
                )));
            }
        }

        info!("Loading VITS voice from: {}", config.tts_model_path);

        let tts = VitsTts::new(VitsTtsConfig {
            model: config.tts_model_path.clone(),
            tokens: config.tts_tokens_path.clone(),
            data_dir: config.tts_data_dir.clone().unwrap_or_default(),
            length_scale: 1.0,
            ..Default::default()
        });

        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| VoiceChatError::AudioDeviceError(e.to_string()))?;

        Ok(Self {
            tts,
            speaker_id: config.tts_speaker_id,
            _stream: stream,
            handle,
        })
    }
}

impl SpeechBackend for NeuralVoice {
    fn name(&self) -> &'static str {
        "neural voice"
    }

    fn say(&mut self, text: &str) -> Result<()> {
        let audio = self
            .tts
            .create(text, self.speaker_id, 1.0)
            .map_err(|e| VoiceChatError::SynthesisError(format!("Synthesis failed: {}", e)))?;

        let sample_rate = audio.sample_rate as u32;
        debug!(
            "Synthesized {} samples ({:.2}s)",
            audio.samples.len(),
            audio.samples.len() as f32 / sample_rate as f32
        );

        let sink = Sink::try_new(&self.handle)
            .map_err(|e| VoiceChatError::AudioDeviceError(e.to_string()))?;
        sink.append(SamplesBuffer::new(1, sample_rate, audio.samples));
        sink.sleep_until_end();
        Ok(())
    }
}

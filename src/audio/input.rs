use crate::audio::resampler::downmix;
use crate::{Result, VoiceChatError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Microphone capture delivering mono chunks at the device rate
pub struct MicrophoneInput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    capturing: Arc<AtomicBool>,
}

impl MicrophoneInput {
    /// Open the default input device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| VoiceChatError::AudioDeviceError("No input device available".into()))?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_input_config()
            .map_err(|e| {
                VoiceChatError::AudioDeviceError(format!("Failed to get input config: {}", e))
            })?
            .into();

        Ok(Self {
            device,
            config,
            stream: None,
            capturing: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Flag the audio callback checks before forwarding samples.
    /// Clearing it from another thread mutes capture without touching the stream.
    pub fn capture_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.capturing)
    }

    /// Start capturing and forward mono samples to `audio_tx`
    pub fn start(&mut self, audio_tx: Sender<Vec<f32>>) -> Result<()> {
        if self.stream.is_some() {
            warn!("Microphone already open");
            self.capturing.store(true, Ordering::SeqCst);
            return Ok(());
        }

        let channels = self.config.channels as usize;
        let capturing = Arc::clone(&self.capturing);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !capturing.load(Ordering::Relaxed) {
                        return;
                    }
                    if let Err(e) = audio_tx.try_send(downmix(data, channels)) {
                        debug!("Dropped audio chunk: {}", e);
                    }
                },
                |err| error!("Audio input stream error: {}", err),
                None,
            )
            .map_err(|e| {
                VoiceChatError::AudioDeviceError(format!("Failed to build input stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            VoiceChatError::AudioDeviceError(format!("Failed to start input stream: {}", e))
        })?;

        self.capturing.store(true, Ordering::SeqCst);
        self.stream = Some(stream);

        info!("Microphone capture started");
        Ok(())
    }

    /// Stop capturing and release the stream
    pub fn stop(&mut self) {
        self.capturing.store(false, Ordering::SeqCst);

        if self.stream.take().is_some() {
            info!("Microphone capture stopped");
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for MicrophoneInput {
    fn drop(&mut self) {
        self.stop();
    }
}

//! Sample-rate conversion for speech audio
//!
//! Recognition wants 16 kHz mono; microphones usually deliver 44.1 or
//! 48 kHz, often with more than one channel.

use crate::{Result, VoiceChatError};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Sample rate expected by the recognizer
pub const SPEECH_SAMPLE_RATE: u32 = 16_000;

const CHUNK_FRAMES: usize = 1024;

/// Average interleaved frames down to a single channel
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Mono resampler with a fixed input and output rate
pub struct MonoResampler {
    resampler: SincFixedIn<f32>,
    input_rate: u32,
    output_rate: u32,
}

impl MonoResampler {
    pub fn new(input_rate: u32, output_rate: u32) -> Result<Self> {
        if input_rate == 0 || output_rate == 0 {
            return Err(VoiceChatError::ConfigError(
                "Sample rates must be greater than 0".into(),
            ));
        }

        let params = SincInterpolationParameters {
            sinc_len: 128,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 128,
            window: WindowFunction::BlackmanHarris2,
        };

        let resampler = SincFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            2.0,
            params,
            CHUNK_FRAMES,
            1,
        )
        .map_err(|e| {
            VoiceChatError::AudioProcessingError(format!("Failed to create resampler: {}", e))
        })?;

        debug!("Created resampler: {} Hz -> {} Hz", input_rate, output_rate);

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
        })
    }

    /// Resample a complete mono buffer
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let ratio = self.output_rate as f64 / self.input_rate as f64;
        let expected = (input.len() as f64 * ratio).ceil() as usize;
        let mut output = Vec::with_capacity(expected + CHUNK_FRAMES);

        for chunk in input.chunks(CHUNK_FRAMES) {
            // SincFixedIn wants exactly CHUNK_FRAMES per call
            let mut block = vec![0.0f32; CHUNK_FRAMES];
            block[..chunk.len()].copy_from_slice(chunk);

            let wave_in = vec![block];
            let processed = self
                .resampler
                .process(&wave_in, None)
                .map_err(|e| {
                    VoiceChatError::AudioProcessingError(format!("Resampling failed: {}", e))
                })?;

            let produced = &processed[0];
            let take = if chunk.len() < CHUNK_FRAMES {
                ((chunk.len() as f64) * ratio).ceil() as usize
            } else {
                produced.len()
            };
            output.extend_from_slice(&produced[..take.min(produced.len())]);
        }

        self.resampler.reset();
        Ok(output)
    }
}

/// Resample mono audio in one step
pub fn resample_mono(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == output_rate {
        return Ok(input.to_vec());
    }
    MonoResampler::new(input_rate, output_rate)?.process(input)
}

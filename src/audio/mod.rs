#[cfg(feature = "audio-io")]
pub mod input;
pub mod resampler;

#[cfg(feature = "audio-io")]
pub use input::MicrophoneInput;
pub use resampler::{downmix, resample_mono, MonoResampler, SPEECH_SAMPLE_RATE};

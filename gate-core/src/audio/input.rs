//! Audio capture using cpal
//!
//! Opens the default capture device and feeds downmixed mono samples
//! into a ring buffer for the processing thread.

use super::buffer::SampleWriter;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use log::warn;
use thiserror::Error;

/// Device acquisition and stream failures
///
/// Surfaced to the caller as-is; the core never retries, since these
/// typically reflect permissions or hardware issues outside its control.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("no default audio {0} device available")]
    DeviceUnavailable(&'static str),

    #[error("failed to query audio device: {0}")]
    DeviceConfig(String),

    #[error("failed to build audio stream: {0}")]
    BuildStream(String),

    #[error("failed to start audio stream: {0}")]
    PlayStream(String),

    #[error("device runs at {actual} Hz, session configured for {expected} Hz")]
    UnsupportedSampleRate { expected: u32, actual: u32 },
}

/// Audio device information
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Capture stream from the default input device
pub struct CaptureStream {
    stream: Stream,
    info: DeviceInfo,
}

impl CaptureStream {
    /// Open the default capture device
    ///
    /// Interleaved input channels are downmixed to mono before they reach
    /// the ring buffer. Refuses to open a device whose rate differs from
    /// the session's configured sample rate.
    pub fn open(mut writer: SampleWriter, expected_rate: u32) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioError::DeviceUnavailable("capture"))?;

        let name = device
            .name()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;
        let config = device
            .default_input_config()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;

        let sample_rate = config.sample_rate().0;
        if sample_rate != expected_rate {
            return Err(AudioError::UnsupportedSampleRate {
                expected: expected_rate,
                actual: sample_rate,
            });
        }

        let channels = config.channels();
        let info = DeviceInfo {
            name,
            sample_rate,
            channels,
        };
        let stream_config: StreamConfig = config.into();

        let ch = channels as usize;
        let mut mono: Vec<f64> = Vec::new();
        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    mono.clear();
                    mono.extend(data.chunks(ch).map(|frame| {
                        frame.iter().map(|&s| s as f64).sum::<f64>() / ch as f64
                    }));

                    let written = writer.write(&mono);
                    if written < mono.len() {
                        warn!("capture overrun, dropped {} samples", mono.len() - written);
                    }
                },
                move |err| warn!("capture stream error: {err}"),
                None,
            )
            .map_err(|e| AudioError::BuildStream(e.to_string()))?;

        Ok(Self { stream, info })
    }

    /// Start capturing
    pub fn start(&self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    /// Pause capture
    pub fn pause(&self) -> Result<(), AudioError> {
        self.stream
            .pause()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }
}

//! Audio playback using cpal
//!
//! Drains gated mono samples from a ring buffer and duplicates them to
//! every channel of the default output device. Underruns play silence.

use super::buffer::SampleReader;
use super::input::{AudioError, DeviceInfo};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use log::warn;

/// Playback stream to the default output device
pub struct PlaybackStream {
    stream: Stream,
    info: DeviceInfo,
}

impl PlaybackStream {
    /// Open the default output device
    ///
    /// Refuses to open a device whose rate differs from the session's
    /// configured sample rate.
    pub fn open(mut reader: SampleReader, expected_rate: u32) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::DeviceUnavailable("output"))?;

        let name = device
            .name()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;
        let config = device
            .default_output_config()
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
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let frames = data.len() / ch;
                    mono.resize(frames, 0.0);
                    let read = reader.read(&mut mono);

                    for (i, frame) in data.chunks_mut(ch).enumerate() {
                        let sample = if i < read { mono[i] as f32 } else { 0.0 };
                        frame.fill(sample);
                    }
                },
                move |err| warn!("playback stream error: {err}"),
                None,
            )
            .map_err(|e| AudioError::BuildStream(e.to_string()))?;

        Ok(Self { stream, info })
    }

    /// Start playback
    pub fn start(&self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    /// Pause playback
    pub fn pause(&self) -> Result<(), AudioError> {
        self.stream
            .pause()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }
}

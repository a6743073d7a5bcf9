//! Session driver owning the capture → analysis → gain → playback path
//!
//! One real-time worker thread pulls analysis frames from the capture
//! ring, runs the pipeline, scales the frame by the decided gain, and
//! pushes it to the playback ring. Control-plane calls (calibration,
//! observability, stop) come from a single owning thread.

use super::buffer::SampleRing;
use super::input::{AudioError, CaptureStream};
use super::output::PlaybackStream;
use super::pipeline::{apply_gain, PipelineState, SessionConfig};
use crate::error::GateError;
use crate::gate::CalibrationStatus;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Failures starting or controlling a session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Gate(#[from] GateError),
}

/// Owning handle for one processing session
///
/// All per-session state (noise profile, gain, calibration progress)
/// lives behind this handle and is released by [`AudioGraph::stop`].
/// Nothing persists across sessions; restarting always requires
/// re-calibration.
pub struct AudioGraph {
    pipeline: Option<Arc<Mutex<PipelineState>>>,
    running: Arc<AtomicBool>,
    worker: Option<std::thread::JoinHandle<()>>,
    capture: Option<CaptureStream>,
    playback: Option<PlaybackStream>,
}

impl AudioGraph {
    /// Acquire the default devices and start processing
    ///
    /// Device failures surface immediately and are never retried.
    pub fn start(config: SessionConfig) -> Result<Self, SessionError> {
        let pipeline = PipelineState::new(config.clone())?;

        let window_size = config.window_size;
        let ramp_samples = config.ramp_samples();

        // Two seconds of headroom on either side of the worker.
        let ring_capacity = config.sample_rate as usize * 2;
        let (capture_writer, mut capture_reader) = SampleRing::new(ring_capacity).split();
        let (mut playback_writer, playback_reader) = SampleRing::new(ring_capacity).split();

        let capture = CaptureStream::open(capture_writer, config.sample_rate)?;
        let playback = PlaybackStream::open(playback_reader, config.sample_rate)?;
        capture.start()?;
        playback.start()?;
        info!(
            "session started on '{}' at {} Hz, window {} samples",
            capture.info().name,
            config.sample_rate,
            window_size
        );

        let pipeline = Arc::new(Mutex::new(pipeline));
        let running = Arc::new(AtomicBool::new(true));

        let worker_pipeline = Arc::clone(&pipeline);
        let worker_running = Arc::clone(&running);
        let worker = std::thread::spawn(move || {
            let mut frame = vec![0.0; window_size];
            let mut applied_gain = 0.0;

            while worker_running.load(Ordering::SeqCst) {
                if capture_reader.available() >= window_size {
                    capture_reader.read(&mut frame);

                    let gain = match worker_pipeline.lock() {
                        Ok(mut pipeline) => match pipeline.process_frame(&frame) {
                            Ok(gain) => gain,
                            Err(e) => {
                                // Hold the last applied gain rather than
                                // leak ungated audio.
                                warn!("frame failed, holding gain: {e}");
                                applied_gain
                            }
                        },
                        Err(_) => applied_gain,
                    };

                    apply_gain(&mut frame, applied_gain, gain, ramp_samples);
                    applied_gain = gain;

                    let written = playback_writer.write(&frame);
                    if written < frame.len() {
                        warn!("playback overrun, dropped {} samples", frame.len() - written);
                    }
                } else {
                    // Not a full frame yet; 100 µs keeps latency low
                    // without spin-waiting.
                    std::thread::sleep(std::time::Duration::from_micros(100));
                }
            }
        });

        Ok(Self {
            pipeline: Some(pipeline),
            running,
            worker: Some(worker),
            capture: Some(capture),
            playback: Some(playback),
        })
    }

    /// Start learning a fresh background-noise profile
    ///
    /// No-op on a stopped session.
    pub fn begin_calibration(&self) -> Result<(), SessionError> {
        if let Some(pipeline) = &self.pipeline {
            if let Ok(mut pipeline) = pipeline.lock() {
                pipeline.begin_calibration()?;
                info!("calibration started");
            }
        }
        Ok(())
    }

    /// Discard an in-flight calibration immediately
    pub fn cancel_calibration(&self) {
        if let Some(pipeline) = &self.pipeline {
            if let Ok(mut pipeline) = pipeline.lock() {
                pipeline.cancel_calibration();
            }
        }
    }

    pub fn calibration_status(&self) -> CalibrationStatus {
        self.pipeline
            .as_ref()
            .and_then(|p| p.lock().ok().map(|p| p.calibration_status()))
            .unwrap_or(CalibrationStatus::NotStarted)
    }

    /// Gain last applied by the gate, for observability and testing
    pub fn current_gain(&self) -> f64 {
        self.pipeline
            .as_ref()
            .and_then(|p| p.lock().ok().map(|p| p.current_gain()))
            .unwrap_or(0.0)
    }

    /// Stop the session and release every per-session resource
    ///
    /// Idempotent. When this returns the worker has exited, both streams
    /// are paused and dropped, and the noise profile, gain state, and any
    /// calibration progress are gone.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        if let Some(capture) = self.capture.take() {
            let _ = capture.pause();
        }
        if let Some(playback) = self.playback.take() {
            let _ = playback.pause();
        }
        if self.pipeline.take().is_some() {
            info!("session stopped");
        }
    }
}

impl Drop for AudioGraph {
    fn drop(&mut self) {
        self.stop();
    }
}

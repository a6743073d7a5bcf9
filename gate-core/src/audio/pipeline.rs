//! Per-frame routing between calibration and gating
//!
//! [`PipelineState`] owns every per-session DSP object and advances one
//! analysis frame at a time. One clock drives everything — the real-time
//! thread in production, a plain loop in tests — so frame ordering stays
//! deterministic.

use crate::error::GateError;
use crate::gate::calibration::{DEFAULT_DURATION_MS, DEFAULT_INTERVAL_MS};
use crate::gate::{
    CalibrationStatus, GainState, GateTunables, NoiseProfileCalibrator, SpectralGateController,
};
use crate::spectrum::{AnalyzerConfig, SpectrumAnalyzer};
use log::info;

/// Everything a session needs to know up front
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Analysis window size in samples (power of two)
    pub window_size: usize,

    /// Required device sample rate in Hz
    pub sample_rate: u32,

    /// Temporal spectrum smoothing in [0, 1)
    pub smoothing: f64,

    /// Gate decision thresholds
    pub tunables: GateTunables,

    /// Calibration length in milliseconds
    pub calibration_duration_ms: u64,

    /// Spacing between calibration captures in milliseconds
    pub calibration_interval_ms: u64,

    /// Milliseconds over which a gain change is ramped at the start of
    /// the next frame. 0 reproduces the reference behavior: an immediate
    /// step at the frame boundary, which can click on large gain jumps.
    pub gain_ramp_ms: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            sample_rate: 48_000,
            smoothing: 0.3,
            tunables: GateTunables::default(),
            calibration_duration_ms: DEFAULT_DURATION_MS,
            calibration_interval_ms: DEFAULT_INTERVAL_MS,
            gain_ramp_ms: 0.0,
        }
    }
}

impl SessionConfig {
    /// Gain ramp length in samples
    pub fn ramp_samples(&self) -> usize {
        (self.gain_ramp_ms / 1000.0 * self.sample_rate as f64) as usize
    }
}

/// Capture → analysis → gain state machine for one session
///
/// Only one of {calibrator, gate} consumes a given frame's spectrum:
/// frames routed to the calibrator pass at the fail-safe floor gain, and
/// the profile produced by a completing calibration only takes effect
/// from the following frame.
pub struct PipelineState {
    config: SessionConfig,
    analyzer: SpectrumAnalyzer,
    calibrator: NoiseProfileCalibrator,
    controller: SpectralGateController,

    /// Frames between calibration captures, at least 1
    interval_frames: u64,
    frames_since_capture: u64,
    frames_processed: u64,
}

impl PipelineState {
    pub fn new(config: SessionConfig) -> Result<Self, GateError> {
        config.tunables.validate()?;
        if config.sample_rate == 0 {
            return Err(GateError::InvalidConfig(
                "sample rate must be positive".into(),
            ));
        }
        if !config.gain_ramp_ms.is_finite() || config.gain_ramp_ms < 0.0 {
            return Err(GateError::InvalidConfig(format!(
                "gain ramp {} ms must be non-negative",
                config.gain_ramp_ms
            )));
        }

        let analyzer = SpectrumAnalyzer::new(AnalyzerConfig {
            window_size: config.window_size,
            smoothing: config.smoothing,
        })?;

        let frame_period_frames = config.calibration_interval_ms as f64 * config.sample_rate as f64
            / (1000.0 * config.window_size as f64);
        let interval_frames = (frame_period_frames.round() as u64).max(1);

        Ok(Self {
            calibrator: NoiseProfileCalibrator::new(),
            controller: SpectralGateController::new(config.tunables.clone()),
            interval_frames,
            frames_since_capture: 0,
            frames_processed: 0,
            analyzer,
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start collecting a fresh noise profile
    ///
    /// The previously installed baseline (if any) is dropped immediately:
    /// once recalibration starts it is considered stale, and the gate
    /// holds the fail-safe floor until the new profile lands.
    pub fn begin_calibration(&mut self) -> Result<(), GateError> {
        self.controller.clear_profile();
        self.frames_since_capture = 0;
        self.calibrator.begin(
            self.config.calibration_duration_ms,
            self.config.calibration_interval_ms,
        )
    }

    /// Discard an in-flight calibration
    ///
    /// Effective immediately; collected spectra are dropped and the gate
    /// stays at the fail-safe floor until a later calibration completes.
    pub fn cancel_calibration(&mut self) {
        self.calibrator.cancel();
    }

    pub fn calibration_status(&self) -> CalibrationStatus {
        self.calibrator.status()
    }

    pub fn current_gain(&self) -> f64 {
        self.controller.gain_state().value
    }

    pub fn gain_state(&self) -> GainState {
        self.controller.gain_state()
    }

    /// Advance the pipeline by one analysis frame, returning the gain to
    /// apply to that frame
    ///
    /// Errors fail the frame without touching calibration averages or the
    /// recorded gain state.
    pub fn process_frame(&mut self, frame: &[f64]) -> Result<f64, GateError> {
        let bins = self.analyzer.analyze(frame)?;

        self.frames_processed += 1;
        let sample_time = self.frames_processed * self.config.window_size as u64;

        let calibrating = matches!(
            self.calibrator.status(),
            CalibrationStatus::InProgress { .. }
        );
        if calibrating {
            if self.frames_since_capture == 0 {
                self.calibrator.supply_spectrum(&bins)?;
            }
            self.frames_since_capture += 1;
            if self.frames_since_capture >= self.interval_frames {
                self.frames_since_capture = 0;
            }

            // The calibrator consumed this frame's spectrum; the gate
            // decision sees no profile and yields the fail-safe floor.
            let gain = self.controller.process(&[], sample_time)?;

            if self.calibrator.is_complete() {
                let profile = self.calibrator.result()?;
                info!(
                    "calibration complete, noise profile over {} bins installed",
                    profile.len()
                );
                self.controller.install_profile(profile);
            }
            return Ok(gain);
        }

        self.controller.process(&bins, sample_time)
    }
}

/// Scale one frame by the gate decision
///
/// The new gain takes effect at the frame boundary, never mid-buffer.
/// With `ramp_samples > 0` the first samples interpolate linearly from
/// the previously applied gain to avoid audible stepping.
pub fn apply_gain(samples: &mut [f64], previous: f64, target: f64, ramp_samples: usize) {
    let ramp = ramp_samples.min(samples.len());
    for (i, s) in samples[..ramp].iter_mut().enumerate() {
        let t = (i + 1) as f64 / ramp as f64;
        *s *= previous + (target - previous) * t;
    }
    for s in samples[ramp..].iter_mut() {
        *s *= target;
    }
}

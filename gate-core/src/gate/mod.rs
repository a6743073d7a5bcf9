//! Spectral-subtraction noise gate: calibration and gain decision

pub mod calibration;
pub mod controller;

pub use calibration::{CalibrationStatus, NoiseProfile, NoiseProfileCalibrator};
pub use controller::{compute_gain, GainState, GateTunables, SpectralGateController};

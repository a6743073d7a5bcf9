//! Real-time spectral-subtraction noise gate
//!
//! Learns a baseline background-noise spectral profile during a
//! calibration phase, then compares each incoming frame's frequency-domain
//! energy against that baseline and scales the output by a single
//! broadband gain: steady background noise is suppressed, transient
//! foreground sound (speech) passes through.
//!
//! The capture → analysis → gain → playback path is owned by
//! [`AudioGraph`]; the DSP underneath ([`SpectrumAnalyzer`],
//! [`gate::NoiseProfileCalibrator`], [`gate::SpectralGateController`]) is
//! pure and synchronously testable.

pub mod audio;
pub mod error;
pub mod gate;
pub mod spectrum;

pub use audio::graph::{AudioGraph, SessionError};
pub use audio::pipeline::{PipelineState, SessionConfig};
pub use error::GateError;
pub use gate::{
    compute_gain, CalibrationStatus, GainState, GateTunables, NoiseProfile,
    NoiseProfileCalibrator, SpectralGateController,
};
pub use spectrum::{AnalyzerConfig, SpectrumAnalyzer};

//! Error taxonomy for the analysis, calibration, and gating stages.

use thiserror::Error;

/// Errors from the spectral gate core.
///
/// The data-shape variants (`InvalidFrameSize`, `InconsistentBinCount`,
/// `ProfileMismatch`) indicate a programming or configuration bug: the
/// failing operation aborts immediately and leaves accumulated averages
/// and gate state untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GateError {
    #[error("frame has {actual} samples, expected {expected}")]
    InvalidFrameSize { expected: usize, actual: usize },

    #[error("spectrum has {actual} bins, calibration session expects {expected}")]
    InconsistentBinCount { expected: usize, actual: usize },

    #[error("calibration collected {collected} spectra, at least {required} required")]
    InsufficientSamples { required: usize, collected: usize },

    #[error("live spectrum has {live} bins but noise profile has {profile}")]
    ProfileMismatch { live: usize, profile: usize },

    /// Soft error: a spectrum was supplied outside an active calibration
    /// session. The averaged result is never perturbed.
    #[error("calibration session is not accepting spectra")]
    SessionAlreadyComplete,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

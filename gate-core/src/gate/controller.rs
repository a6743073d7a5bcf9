//! Broadband gate decision from spectral comparison
//!
//! Compares a live spectrum against the calibrated noise profile and
//! derives a single gain in [0, 1]: the larger the fraction of bins that
//! rise significantly above the baseline, the more signal is let through.

use super::calibration::NoiseProfile;
use crate::error::GateError;

/// Tunable thresholds for the gate decision
#[derive(Debug, Clone)]
pub struct GateTunables {
    /// A bin counts as significant when it exceeds the profile by more
    /// than this many dB (strict >).
    pub threshold_db: f64,

    /// Change ratios at or below this fraction keep the gate at the floor.
    pub min_change_ratio: f64,

    /// Fail-safe gain used when quiet or when no profile exists yet.
    pub gain_floor: f64,

    /// Linear scale from change ratio to gain, clamped to 1.0.
    pub gain_ceiling_multiplier: f64,
}

impl Default for GateTunables {
    fn default() -> Self {
        Self {
            threshold_db: 6.0,
            min_change_ratio: 0.1,
            gain_floor: 0.1,
            gain_ceiling_multiplier: 3.0,
        }
    }
}

impl GateTunables {
    pub fn validate(&self) -> Result<(), GateError> {
        if !(0.0..=1.0).contains(&self.gain_floor) {
            return Err(GateError::InvalidConfig(format!(
                "gain floor {} out of range [0, 1]",
                self.gain_floor
            )));
        }
        if !(0.0..=1.0).contains(&self.min_change_ratio) {
            return Err(GateError::InvalidConfig(format!(
                "min change ratio {} out of range [0, 1]",
                self.min_change_ratio
            )));
        }
        if self.gain_ceiling_multiplier <= 0.0 {
            return Err(GateError::InvalidConfig(format!(
                "gain ceiling multiplier {} must be positive",
                self.gain_ceiling_multiplier
            )));
        }
        Ok(())
    }
}

/// Gain last decided by the gate, stamped with the stream sample time
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GainState {
    /// Output gain in [0, 1]; 0.0 until the first frame is processed.
    pub value: f64,

    /// Samples elapsed since session start when the gain was set.
    pub sample_time: u64,
}

/// Per-frame gate decision
///
/// Pure in its inputs: identical spectra, profile, and tunables always
/// produce the identical gain.
///
/// With no profile the result is `gain_floor` — the gate fails toward
/// silence, never toward leaking background noise. A live/profile length
/// mismatch is a `ProfileMismatch` error.
pub fn compute_gain(
    live: &[f64],
    profile: Option<&NoiseProfile>,
    tunables: &GateTunables,
) -> Result<f64, GateError> {
    let Some(profile) = profile else {
        return Ok(tunables.gain_floor);
    };

    if live.len() != profile.len() {
        return Err(GateError::ProfileMismatch {
            live: live.len(),
            profile: profile.len(),
        });
    }
    if live.is_empty() {
        return Ok(tunables.gain_floor);
    }

    let significant = live
        .iter()
        .zip(profile.bins())
        .filter(|&(l, p)| l - p > tunables.threshold_db)
        .count();
    let change_ratio = significant as f64 / live.len() as f64;

    if change_ratio <= tunables.min_change_ratio {
        return Ok(tunables.gain_floor);
    }
    Ok((change_ratio * tunables.gain_ceiling_multiplier).min(1.0))
}

/// Owns the noise profile and the last gain decision for one session
pub struct SpectralGateController {
    tunables: GateTunables,
    profile: Option<NoiseProfile>,
    gain: GainState,
}

impl SpectralGateController {
    pub fn new(tunables: GateTunables) -> Self {
        Self {
            tunables,
            profile: None,
            gain: GainState::default(),
        }
    }

    /// Install the baseline produced by a completed calibration
    pub fn install_profile(&mut self, profile: NoiseProfile) {
        self.profile = Some(profile);
    }

    /// Drop the baseline; the gate falls back to the fail-safe floor
    pub fn clear_profile(&mut self) {
        self.profile = None;
    }

    pub fn has_profile(&self) -> bool {
        self.profile.is_some()
    }

    pub fn gain_state(&self) -> GainState {
        self.gain
    }

    pub fn tunables(&self) -> &GateTunables {
        &self.tunables
    }

    /// Decide the gain for one frame and record it at `sample_time`
    ///
    /// On error the previous gain state is left untouched.
    pub fn process(&mut self, live: &[f64], sample_time: u64) -> Result<f64, GateError> {
        let value = compute_gain(live, self.profile.as_ref(), &self.tunables)?;
        self.gain = GainState { value, sample_time };
        Ok(value)
    }
}

//! Background-noise profile calibration
//!
//! The calibrator is a pure accumulator: it never schedules timers. The
//! driving loop decides when to feed it a spectrum, so an entire session
//! can be run synchronously in tests.

use crate::error::GateError;

/// Default calibration window: 2 s sampled every 100 ms -> 20 spectra.
pub const DEFAULT_DURATION_MS: u64 = 2000;
pub const DEFAULT_INTERVAL_MS: u64 = 100;

/// Per-bin average background energy in dB.
///
/// Only a completed calibration session produces one of these; its length
/// must match the live spectrum at comparison time.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseProfile {
    bins: Vec<f64>,
}

impl NoiseProfile {
    pub(crate) fn from_bins(bins: Vec<f64>) -> Self {
        Self { bins }
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Observable calibration progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStatus {
    NotStarted,
    InProgress { collected: usize, target: usize },
    Complete,
}

enum State {
    Idle,
    Collecting {
        target: usize,
        collected: usize,
        /// Per-bin running sums; length fixed by the first spectrum.
        sums: Vec<f64>,
    },
    Complete {
        profile: NoiseProfile,
    },
}

/// Averages captured spectra into a [`NoiseProfile`]
///
/// State machine: `Idle -> Collecting(n/N) -> Complete`, advanced one
/// `supply_spectrum` call at a time.
pub struct NoiseProfileCalibrator {
    state: State,
}

impl Default for NoiseProfileCalibrator {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseProfileCalibrator {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    /// Start a calibration session
    ///
    /// The expected sample count is `duration_ms / interval_ms` (integer
    /// floor). Any session in progress is discarded.
    pub fn begin(&mut self, duration_ms: u64, interval_ms: u64) -> Result<(), GateError> {
        if interval_ms == 0 {
            return Err(GateError::InvalidConfig(
                "calibration sample interval must be positive".into(),
            ));
        }
        let target = (duration_ms / interval_ms) as usize;
        if target == 0 {
            return Err(GateError::InvalidConfig(format!(
                "calibration duration {duration_ms} ms shorter than sample interval {interval_ms} ms"
            )));
        }

        self.state = State::Collecting {
            target,
            collected: 0,
            sums: Vec::new(),
        };
        Ok(())
    }

    /// Feed one captured spectrum into the running session
    ///
    /// All spectra within a session must have identical length; a mismatch
    /// aborts the session (`InconsistentBinCount`) rather than silently
    /// averaging incompatible data. Supplying outside an active session
    /// returns `SessionAlreadyComplete` and never perturbs a finished
    /// average.
    pub fn supply_spectrum(&mut self, bins: &[f64]) -> Result<(), GateError> {
        let State::Collecting {
            target,
            collected,
            sums,
        } = &mut self.state
        else {
            return Err(GateError::SessionAlreadyComplete);
        };

        if *collected == 0 {
            *sums = bins.to_vec();
        } else {
            if bins.len() != sums.len() {
                let expected = sums.len();
                self.state = State::Idle;
                return Err(GateError::InconsistentBinCount {
                    expected,
                    actual: bins.len(),
                });
            }
            for (sum, &b) in sums.iter_mut().zip(bins.iter()) {
                *sum += b;
            }
        }
        *collected += 1;
        log::debug!("calibration sample {collected}/{target} collected");

        if *collected >= *target {
            let n = *collected as f64;
            let bins = sums.iter().map(|&s| s / n).collect();
            self.state = State::Complete {
                profile: NoiseProfile::from_bins(bins),
            };
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, State::Complete { .. })
    }

    pub fn status(&self) -> CalibrationStatus {
        match &self.state {
            State::Idle => CalibrationStatus::NotStarted,
            State::Collecting {
                target, collected, ..
            } => CalibrationStatus::InProgress {
                collected: *collected,
                target: *target,
            },
            State::Complete { .. } => CalibrationStatus::Complete,
        }
    }

    /// Take the averaged profile of a completed session
    pub fn result(&self) -> Result<NoiseProfile, GateError> {
        match &self.state {
            State::Complete { profile } => Ok(profile.clone()),
            State::Collecting {
                target, collected, ..
            } => Err(GateError::InsufficientSamples {
                required: *target,
                collected: *collected,
            }),
            State::Idle => Err(GateError::InsufficientSamples {
                required: 1,
                collected: 0,
            }),
        }
    }

    /// Discard the session, collected samples included
    pub fn cancel(&mut self) {
        self.state = State::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_yields_twenty_samples() {
        let mut cal = NoiseProfileCalibrator::new();
        cal.begin(DEFAULT_DURATION_MS, DEFAULT_INTERVAL_MS).unwrap();

        assert_eq!(
            cal.status(),
            CalibrationStatus::InProgress {
                collected: 0,
                target: 20
            }
        );
    }

    #[test]
    fn test_target_is_floor_of_duration_over_interval() {
        let mut cal = NoiseProfileCalibrator::new();
        cal.begin(2500, 1000).unwrap();

        assert_eq!(
            cal.status(),
            CalibrationStatus::InProgress {
                collected: 0,
                target: 2
            }
        );
    }

    #[test]
    fn test_constant_spectra_average_to_same_value() {
        let mut cal = NoiseProfileCalibrator::new();
        cal.begin(2000, 100).unwrap();

        for _ in 0..20 {
            cal.supply_spectrum(&[-42.5; 64]).unwrap();
        }

        assert!(cal.is_complete());
        let profile = cal.result().unwrap();
        assert_eq!(profile.len(), 64);
        assert!(profile.bins().iter().all(|&b| (b - (-42.5)).abs() < 1e-12));
    }

    #[test]
    fn test_mean_of_varying_spectra() {
        let mut cal = NoiseProfileCalibrator::new();
        cal.begin(200, 100).unwrap();

        cal.supply_spectrum(&[-80.0, -60.0]).unwrap();
        cal.supply_spectrum(&[-40.0, -20.0]).unwrap();

        let profile = cal.result().unwrap();
        assert_eq!(profile.bins(), &[-60.0, -40.0]);
    }

    #[test]
    fn test_inconsistent_bin_count_aborts_session() {
        let mut cal = NoiseProfileCalibrator::new();
        cal.begin(2000, 100).unwrap();

        cal.supply_spectrum(&[-50.0; 64]).unwrap();
        let err = cal.supply_spectrum(&[-50.0; 32]).unwrap_err();

        assert_eq!(
            err,
            GateError::InconsistentBinCount {
                expected: 64,
                actual: 32
            }
        );
        assert_eq!(cal.status(), CalibrationStatus::NotStarted);
    }

    #[test]
    fn test_supply_after_complete_does_not_corrupt_result() {
        let mut cal = NoiseProfileCalibrator::new();
        cal.begin(100, 100).unwrap();
        cal.supply_spectrum(&[-30.0; 8]).unwrap();
        assert!(cal.is_complete());

        let before = cal.result().unwrap();
        let err = cal.supply_spectrum(&[0.0; 8]).unwrap_err();
        assert_eq!(err, GateError::SessionAlreadyComplete);
        assert_eq!(cal.result().unwrap(), before);
    }

    #[test]
    fn test_supply_without_session() {
        let mut cal = NoiseProfileCalibrator::new();
        let err = cal.supply_spectrum(&[-30.0; 8]).unwrap_err();
        assert_eq!(err, GateError::SessionAlreadyComplete);
    }

    #[test]
    fn test_result_before_complete_is_insufficient() {
        let mut cal = NoiseProfileCalibrator::new();
        cal.begin(2000, 100).unwrap();
        cal.supply_spectrum(&[-50.0; 4]).unwrap();

        let err = cal.result().unwrap_err();
        assert_eq!(
            err,
            GateError::InsufficientSamples {
                required: 20,
                collected: 1
            }
        );
    }

    #[test]
    fn test_cancel_discards_collected_samples() {
        let mut cal = NoiseProfileCalibrator::new();
        cal.begin(2000, 100).unwrap();
        cal.supply_spectrum(&[-50.0; 4]).unwrap();

        cal.cancel();
        assert_eq!(cal.status(), CalibrationStatus::NotStarted);
        assert!(cal.result().is_err());
    }

    #[test]
    fn test_begin_restarts_session() {
        let mut cal = NoiseProfileCalibrator::new();
        cal.begin(200, 100).unwrap();
        cal.supply_spectrum(&[-10.0; 4]).unwrap();

        cal.begin(100, 100).unwrap();
        cal.supply_spectrum(&[-90.0; 4]).unwrap();

        let profile = cal.result().unwrap();
        assert!(profile.bins().iter().all(|&b| b == -90.0));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut cal = NoiseProfileCalibrator::new();
        assert!(matches!(
            cal.begin(2000, 0),
            Err(GateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_duration_shorter_than_interval_rejected() {
        let mut cal = NoiseProfileCalibrator::new();
        assert!(matches!(
            cal.begin(50, 100),
            Err(GateError::InvalidConfig(_))
        ));
    }
}

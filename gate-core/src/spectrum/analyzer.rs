//! Log-magnitude spectrum analysis with temporal smoothing
//!
//! Converts one time-domain analysis frame into dB bins. Successive
//! spectra are blended with an exponential smoothing factor so the gate
//! decision downstream does not chase frame-to-frame jitter.

use super::fft::FftEngine;
use crate::error::GateError;
use std::f64::consts::PI;

/// Floor applied to log-magnitude bins so silent bins stay finite.
pub const DB_FLOOR: f64 = -100.0;

/// Spectrum analyzer configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Analysis window size in samples (must be a power of two)
    pub window_size: usize,

    /// Temporal smoothing factor in [0, 1). Near 0 gives instantaneous
    /// spectra; near 1 gives heavy smoothing and a slower gate response.
    pub smoothing: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            smoothing: 0.3,
        }
    }
}

/// Real-time spectrum analyzer producing smoothed dB bins
///
/// Output length is `window_size / 2` (Nyquist-limited real-input
/// spectrum). Apart from the smoothing memory the analyzer has no state:
/// the same frame sequence always produces the same spectra.
pub struct SpectrumAnalyzer {
    config: AnalyzerConfig,
    fft_engine: FftEngine,

    /// Precomputed Hann window
    window: Vec<f64>,

    /// Windowed copy of the current frame
    windowed: Vec<f64>,

    /// Raw |X[k]| including the Nyquist bin
    raw: Vec<f64>,

    /// Smoothed linear magnitudes carried across frames
    smoothed: Vec<f64>,

    /// False until the first frame seeds the smoothing memory
    primed: bool,
}

impl SpectrumAnalyzer {
    /// Create new spectrum analyzer
    pub fn new(config: AnalyzerConfig) -> Result<Self, GateError> {
        if config.window_size < 2 || !config.window_size.is_power_of_two() {
            return Err(GateError::InvalidConfig(format!(
                "window size {} is not a power of two",
                config.window_size
            )));
        }
        if !(0.0..1.0).contains(&config.smoothing) {
            return Err(GateError::InvalidConfig(format!(
                "smoothing factor {} out of range [0, 1)",
                config.smoothing
            )));
        }

        let n = config.window_size;
        let fft_engine = FftEngine::new(n);
        let raw = vec![0.0; fft_engine.num_bins()];

        Ok(Self {
            window: hann_window(n),
            windowed: vec![0.0; n],
            raw,
            smoothed: vec![0.0; n / 2],
            primed: false,
            config,
            fft_engine,
        })
    }

    /// Number of output bins (window size / 2)
    pub fn num_bins(&self) -> usize {
        self.config.window_size / 2
    }

    /// Get current configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze one frame and return smoothed log-magnitude bins in dB
    ///
    /// The frame must be exactly `window_size` samples, otherwise
    /// `InvalidFrameSize` is returned and the smoothing memory is left
    /// untouched. Numerically negligible bins are floored at [`DB_FLOOR`].
    pub fn analyze(&mut self, frame: &[f64]) -> Result<Vec<f64>, GateError> {
        if frame.len() != self.config.window_size {
            return Err(GateError::InvalidFrameSize {
                expected: self.config.window_size,
                actual: frame.len(),
            });
        }

        for ((w, &coeff), &sample) in self
            .windowed
            .iter_mut()
            .zip(self.window.iter())
            .zip(frame.iter())
        {
            *w = coeff * sample;
        }

        self.fft_engine.magnitude_into(&self.windowed, &mut self.raw);

        // Smoothing runs on linear magnitudes, then the result is taken
        // to dB. First frame seeds the memory directly.
        let bins = self.num_bins();
        if self.primed {
            let s = self.config.smoothing;
            for (m, &x) in self.smoothed.iter_mut().zip(self.raw[..bins].iter()) {
                *m = s * *m + (1.0 - s) * x;
            }
        } else {
            self.smoothed.copy_from_slice(&self.raw[..bins]);
            self.primed = true;
        }

        Ok(self
            .smoothed
            .iter()
            .map(|&m| (20.0 * m.log10()).max(DB_FLOOR))
            .collect())
    }

    /// Clear the temporal smoothing memory
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
        self.primed = false;
    }
}

/// Hann window: w[n] = 0.5 - 0.5*cos(2πn/(N-1))
fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_frame(n: usize, normalized_freq: f64, amplitude: f64) -> Vec<f64> {
        (0..n)
            .map(|i| amplitude * (normalized_freq * PI * i as f64).sin())
            .collect()
    }

    #[test]
    fn test_rejects_non_power_of_two_window() {
        let config = AnalyzerConfig {
            window_size: 1000,
            smoothing: 0.3,
        };
        assert!(matches!(
            SpectrumAnalyzer::new(config),
            Err(GateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_smoothing_of_one() {
        let config = AnalyzerConfig {
            window_size: 1024,
            smoothing: 1.0,
        };
        assert!(matches!(
            SpectrumAnalyzer::new(config),
            Err(GateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_frame_size() {
        let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let short_frame = vec![0.0; 1024];

        let err = analyzer.analyze(&short_frame).unwrap_err();
        assert_eq!(
            err,
            GateError::InvalidFrameSize {
                expected: 2048,
                actual: 1024
            }
        );
    }

    #[test]
    fn test_bin_count_is_half_window() {
        let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let frame = vec![0.0; 2048];

        let bins = analyzer.analyze(&frame).unwrap();
        assert_eq!(bins.len(), 1024);
    }

    #[test]
    fn test_silence_hits_db_floor() {
        let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let frame = vec![0.0; 2048];

        let bins = analyzer.analyze(&frame).unwrap();
        assert!(bins.iter().all(|&b| b == DB_FLOOR));
    }

    #[test]
    fn test_sine_peak_lands_on_expected_bin() {
        let config = AnalyzerConfig {
            window_size: 1024,
            smoothing: 0.0,
        };
        let mut analyzer = SpectrumAnalyzer::new(config).unwrap();

        let freq = 0.25; // 0.25π rad/sample -> bin 128 of 512
        let frame = sine_frame(1024, freq, 1.0);
        let bins = analyzer.analyze(&frame).unwrap();

        let (peak_bin, _) = bins
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();

        let expected_bin = (freq * 1024.0 / 2.0).round() as usize;
        assert!((peak_bin as i32 - expected_bin as i32).abs() <= 1);
    }

    #[test]
    fn test_smoothing_slows_decay() {
        let config = AnalyzerConfig {
            window_size: 1024,
            smoothing: 0.9,
        };
        let mut analyzer = SpectrumAnalyzer::new(config).unwrap();

        let loud = sine_frame(1024, 0.25, 1.0);
        let loud_bins = analyzer.analyze(&loud).unwrap();
        let peak = 128;

        // One silent frame: heavy smoothing keeps most of the energy.
        let silent_bins = analyzer.analyze(&vec![0.0; 1024]).unwrap();
        assert!(silent_bins[peak] > DB_FLOOR);
        assert!(silent_bins[peak] < loud_bins[peak]);
        // 0.9 of linear magnitude retained is less than 1 dB down.
        assert!(loud_bins[peak] - silent_bins[peak] < 2.0);
    }

    #[test]
    fn test_no_smoothing_is_instantaneous() {
        let config = AnalyzerConfig {
            window_size: 1024,
            smoothing: 0.0,
        };
        let mut analyzer = SpectrumAnalyzer::new(config).unwrap();

        analyzer.analyze(&sine_frame(1024, 0.25, 1.0)).unwrap();
        let silent_bins = analyzer.analyze(&vec![0.0; 1024]).unwrap();

        assert!(silent_bins.iter().all(|&b| b == DB_FLOOR));
    }

    #[test]
    fn test_reset_clears_memory() {
        let config = AnalyzerConfig {
            window_size: 1024,
            smoothing: 0.9,
        };
        let mut analyzer = SpectrumAnalyzer::new(config).unwrap();

        analyzer.analyze(&sine_frame(1024, 0.25, 1.0)).unwrap();
        analyzer.reset();

        let silent_bins = analyzer.analyze(&vec![0.0; 1024]).unwrap();
        assert!(silent_bins.iter().all(|&b| b == DB_FLOOR));
    }
}

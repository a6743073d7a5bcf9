//! FFT engine using realfft for real-valued signals
//!
//! Plans the transform once and reuses its buffers so per-frame analysis
//! stays allocation-free on the real-time path.

use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// Forward FFT for real-valued analysis frames
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Real FFT processor
    r2c: Arc<dyn RealToComplex<f64>>,

    /// Reusable input buffer
    input_buffer: Vec<f64>,

    /// Reusable output buffer (complex spectrum)
    output_buffer: Vec<num_complex::Complex<f64>>,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples)
    pub fn new(fft_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);

        let input_buffer = vec![0.0; fft_size];
        let output_buffer = vec![num_complex::Complex::new(0.0, 0.0); fft_size / 2 + 1];

        Self {
            fft_size,
            r2c,
            input_buffer,
            output_buffer,
        }
    }

    /// Compute |X[k]| for the positive-frequency bins of `signal`
    ///
    /// The signal is zero-padded if shorter than the FFT size. `out` must
    /// hold at most [`Self::num_bins`] values; it is filled front to back.
    pub fn magnitude_into(&mut self, signal: &[f64], out: &mut [f64]) {
        let copy_len = signal.len().min(self.fft_size);
        self.input_buffer[..copy_len].copy_from_slice(&signal[..copy_len]);
        if copy_len < self.fft_size {
            self.input_buffer[copy_len..].fill(0.0);
        }

        self.r2c
            .process(&mut self.input_buffer, &mut self.output_buffer)
            .expect("FFT processing failed");

        for (o, c) in out.iter_mut().zip(self.output_buffer.iter()) {
            *o = c.norm();
        }
    }

    /// Compute FFT and return the magnitude spectrum
    pub fn compute_magnitude(&mut self, signal: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.num_bins()];
        self.magnitude_into(signal, &mut out);
        out
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }
}

//! Spectral analysis: FFT engine and the smoothed dB analyzer

pub mod analyzer;
pub mod fft;

pub use analyzer::{AnalyzerConfig, SpectrumAnalyzer, DB_FLOOR};
pub use fft::FftEngine;

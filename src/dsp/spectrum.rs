//! FFT helpers for inspecting filters and signals

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::domain::Sample;

/// FFT processor for computing spectral data
pub struct FftProcessor {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
}

impl FftProcessor {
    /// Create a new FFT processor with the given size
    pub fn new(fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        Self { fft, fft_size }
    }

    /// Compute FFT and return magnitude in dB (20·log10|X|) for all bins.
    /// Input shorter than `fft_size` is zero-padded, longer is truncated.
    pub fn compute(&self, samples: &[Sample]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> =
            samples.iter().take(self.fft_size).copied().collect();
        buffer.resize(self.fft_size, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        buffer
            .iter()
            // Floor avoids -infinity for exact nulls
            .map(|c| 10.0 * c.norm_sqr().max(1e-20).log10())
            .collect()
    }
}

/// Magnitude response of real FIR taps in dB, bins 0..fft_size/2 spanning
/// 0 to half the sample rate
pub fn magnitude_response(taps: &[f32], fft_size: usize) -> Vec<f32> {
    let processor = FftProcessor::new(fft_size);
    let samples: Vec<Sample> = taps.iter().map(|&t| Sample::new(t, 0.0)).collect();
    let mut spectrum = processor.compute(&samples);
    spectrum.truncate(fft_size / 2);
    spectrum
}

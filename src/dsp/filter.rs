//! FIR filter implementation

use crate::domain::Sample;

use super::Block;

/// Causal FIR filter with real taps over complex samples.
///
/// The last `taps − 1` inputs are retained between calls, so splitting a
/// stream into blocks of any size yields the same output.
pub struct FirFilter {
    taps: Vec<f32>,
    /// Previous inputs followed by the current block, oldest first
    buffer: Vec<Sample>,
}

impl FirFilter {
    /// Create a new FIR filter with the given coefficients
    pub fn new(taps: Vec<f32>) -> Self {
        let history = taps.len().saturating_sub(1);
        Self {
            taps,
            buffer: vec![Sample::new(0.0, 0.0); history],
        }
    }

    pub fn taps(&self) -> &[f32] {
        &self.taps
    }

    /// Samples of delay at the filter's centre
    pub fn group_delay(&self) -> usize {
        self.taps.len().saturating_sub(1) / 2
    }

    /// Process a single sample through the filter
    pub fn process(&mut self, sample: Sample) -> Sample {
        let mut out = Vec::with_capacity(1);
        self.filter_into(&[sample], &mut out);
        out[0]
    }

    fn filter_into(&mut self, input: &[Sample], output: &mut Vec<Sample>) {
        let history = self.taps.len().saturating_sub(1);
        self.buffer.extend_from_slice(input);

        output.reserve(input.len());
        for n in 0..input.len() {
            // Window ending at the current sample
            let window = &self.buffer[n..n + history + 1];
            let acc = self
                .taps
                .iter()
                .zip(window.iter().rev())
                .fold(Sample::new(0.0, 0.0), |acc, (&t, &x)| acc + x * t);
            output.push(acc);
        }

        let keep_from = self.buffer.len() - history;
        self.buffer.drain(..keep_from);
    }

    /// Reset the filter state
    pub fn reset(&mut self) {
        self.buffer.fill(Sample::new(0.0, 0.0));
    }
}

impl Block for FirFilter {
    fn name(&self) -> &'static str {
        "fir"
    }

    fn work(&mut self, input: &[Sample], output: &mut Vec<Sample>) {
        self.filter_into(input, output);
    }

    /// Drain the group delay so the last inputs reach the output
    fn flush(&mut self, output: &mut Vec<Sample>) {
        let zeros = vec![Sample::new(0.0, 0.0); self.group_delay()];
        self.filter_into(&zeros, output);
    }
}

//! Phase-locked loop for a directly observable carrier
//!
//! The phase error is the angle between the input and the local
//! oscillator, so the loop locks onto a residual carrier tone. Output is
//! the input derotated by the tracked phase.

use crate::domain::Sample;

use super::loop_filter::{LoopGains, LoopState};
use super::Block;

pub struct Pll {
    state: LoopState,
}

impl Pll {
    /// `max_offset` bounds the frequency estimate, radians/sample
    pub fn new(gains: LoopGains, max_offset: f32) -> Self {
        Self {
            state: LoopState::new(gains, max_offset),
        }
    }

    pub fn process(&mut self, sample: Sample) -> Sample {
        let out = sample * self.state.phasor().conj();
        self.state.advance(out.arg());
        out
    }

    pub fn phase(&self) -> f32 {
        self.state.phase()
    }

    /// Frequency estimate, radians/sample
    pub fn frequency(&self) -> f32 {
        self.state.frequency()
    }

    pub fn is_saturated(&self) -> bool {
        self.state.is_saturated()
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }
}

impl Block for Pll {
    fn name(&self) -> &'static str {
        "pll"
    }

    fn work(&mut self, input: &[Sample], output: &mut Vec<Sample>) {
        output.extend(input.iter().map(|&s| self.process(s)));
    }

    fn carrier_lock(&self) -> Option<(f32, bool)> {
        Some((self.frequency(), self.is_saturated()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_OFFSET: f32 = 0.05;

    fn run_tone(offset: f32, samples: usize) -> (Pll, Sample) {
        let mut pll = Pll::new(LoopGains::new(0.02), MAX_OFFSET);
        let mut out = Sample::new(0.0, 0.0);
        for n in 0..samples {
            out = pll.process(Sample::from_polar(1.0, 1.0 + offset * n as f32));
        }
        (pll, out)
    }

    #[test]
    fn locks_across_clamp_range() {
        for fraction in [0.1f32, 0.5, 0.9] {
            let offset = fraction * MAX_OFFSET;
            let (pll, out) = run_tone(offset, 5000);
            assert!(
                out.arg().abs() < 0.01,
                "offset {offset}: residual phase {}",
                out.arg()
            );
            assert!(
                (pll.frequency() - offset).abs() < 1e-3,
                "offset {offset}: tracked {}",
                pll.frequency()
            );
            assert!(!pll.is_saturated());
        }
    }

    #[test]
    fn negative_offset_locks() {
        let (pll, out) = run_tone(-0.02, 5000);
        assert!(out.arg().abs() < 0.01);
        assert!((pll.frequency() + 0.02).abs() < 1e-3);
    }

    #[test]
    fn out_of_range_offset_pins_at_clamp() {
        let (pll, _) = run_tone(0.5, 20_000);
        assert!(pll.frequency().abs() <= MAX_OFFSET);
    }

    #[test]
    fn reset_returns_to_zero_phase() {
        let (mut pll, _) = run_tone(0.01, 1000);
        pll.reset();
        assert_eq!(pll.phase(), 0.0);
        assert_eq!(pll.frequency(), 0.0);
    }
}

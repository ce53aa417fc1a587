//! Automatic Gain Control

use crate::domain::Sample;

use super::Block;

/// Feedback AGC normalizing signal magnitude to a reference level
pub struct Agc {
    rate: f32,
    reference: f32,
    gain: f32,
    max_gain: f32,
}

impl Agc {
    pub fn new(rate: f32, reference: f32) -> Self {
        Self::with_limits(rate, reference, 1.0, 65536.0)
    }

    pub fn with_limits(rate: f32, reference: f32, initial_gain: f32, max_gain: f32) -> Self {
        Self {
            rate,
            reference,
            gain: initial_gain.min(max_gain),
            max_gain,
        }
    }

    /// Process a sample through AGC
    pub fn process(&mut self, sample: Sample) -> Sample {
        let output = sample * self.gain;

        self.gain += self.rate * (self.reference - output.norm());
        // Keep the gain strictly positive; a huge input can overshoot below zero
        self.gain = self.gain.clamp(f32::MIN_POSITIVE, self.max_gain);

        output
    }

    /// Get current gain value (useful for signal strength indication)
    pub fn current_gain(&self) -> f32 {
        self.gain
    }

    pub fn reset(&mut self) {
        self.gain = 1.0f32.min(self.max_gain);
    }
}

impl Block for Agc {
    fn name(&self) -> &'static str {
        "agc"
    }

    fn work(&mut self, input: &[Sample], output: &mut Vec<Sample>) {
        output.extend(input.iter().map(|&s| self.process(s)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(i: usize, amplitude: f32) -> Sample {
        Sample::from_polar(amplitude, i as f32 * 0.05)
    }

    #[test]
    fn converges_to_reference() {
        for amplitude in [0.1, 0.3, 1.0, 5.0] {
            let mut agc = Agc::new(0.01, 0.707);
            let mut out = Sample::new(0.0, 0.0);
            for i in 0..50_000 {
                out = agc.process(tone(i, amplitude));
                assert!(agc.current_gain() <= 65536.0);
            }
            assert!(
                (out.norm() - 0.707).abs() < 1e-3,
                "amplitude {amplitude} settled at {}",
                out.norm()
            );
        }
    }

    #[test]
    fn gain_never_exceeds_max() {
        let mut agc = Agc::with_limits(0.1, 1.0, 1.0, 4.0);
        for i in 0..10_000 {
            agc.process(tone(i, 1e-6));
            assert!(agc.current_gain() <= 4.0);
            assert!(agc.current_gain() > 0.0);
        }
        assert_eq!(agc.current_gain(), 4.0);
    }

    #[test]
    fn gain_stays_positive_on_huge_input() {
        let mut agc = Agc::new(0.5, 1.0);
        for i in 0..100 {
            agc.process(tone(i, 1e6));
            assert!(agc.current_gain() > 0.0);
        }
    }

    #[test]
    fn reset_restores_unity_gain() {
        let mut agc = Agc::new(0.01, 1.0);
        for i in 0..1000 {
            agc.process(tone(i, 0.1));
        }
        agc.reset();
        assert_eq!(agc.current_gain(), 1.0);
    }
}

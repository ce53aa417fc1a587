//! DC blocker
//!
//! One-pole high-pass: y[n] = x[n] − x[n−1] + (1 − rate)·y[n−1].

use crate::domain::Sample;

use super::Block;

pub struct DcBlocker {
    pole: f32,
    last_input: Sample,
    last_output: Sample,
}

impl DcBlocker {
    /// `rate` in (0, 1) places the pole at `1 − rate`
    pub fn new(rate: f32) -> Self {
        Self {
            pole: 1.0 - rate,
            last_input: Sample::new(0.0, 0.0),
            last_output: Sample::new(0.0, 0.0),
        }
    }

    pub fn process(&mut self, sample: Sample) -> Sample {
        let output = sample - self.last_input + self.last_output * self.pole;
        self.last_input = sample;
        self.last_output = output;
        output
    }

    pub fn reset(&mut self) {
        self.last_input = Sample::new(0.0, 0.0);
        self.last_output = Sample::new(0.0, 0.0);
    }
}

impl Block for DcBlocker {
    fn name(&self) -> &'static str {
        "dc_blocker"
    }

    fn work(&mut self, input: &[Sample], output: &mut Vec<Sample>) {
        output.extend(input.iter().map(|&s| self.process(s)));
    }
}

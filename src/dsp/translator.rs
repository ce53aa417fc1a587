//! Fixed frequency translation
//!
//! Mixes the input with a unit phasor advancing by a constant angle per
//! sample. No feedback; used to move a known subcarrier to baseband.

use crate::domain::Sample;

use super::nco::Nco;
use super::Block;

pub struct FrequencyTranslator {
    nco: Nco,
}

impl FrequencyTranslator {
    /// `step` is the normalized angular increment, radians/sample
    pub fn new(step: f32) -> Self {
        Self { nco: Nco::new(step) }
    }

    /// Translator shifting the spectrum by `shift_hz`
    pub fn from_hz(shift_hz: f64, sample_rate: f64) -> Self {
        Self {
            nco: Nco::from_hz(shift_hz, sample_rate),
        }
    }

    pub fn process(&mut self, sample: Sample) -> Sample {
        sample * self.nco.next_phasor()
    }
}

impl Block for FrequencyTranslator {
    fn name(&self) -> &'static str {
        "translator"
    }

    fn work(&mut self, input: &[Sample], output: &mut Vec<Sample>) {
        output.extend(input.iter().map(|&s| self.process(s)));
    }
}

//! Numerically Controlled Oscillator

use std::f32::consts::TAU;

use crate::domain::Sample;

/// Phase accumulator shared by the translator and the tracking loops.
///
/// Phase is kept in [0, 2π); frequency is in radians/sample.
#[derive(Debug, Clone, Default)]
pub struct Nco {
    phase: f32,
    frequency: f32,
}

impl Nco {
    pub fn new(frequency: f32) -> Self {
        Self {
            phase: 0.0,
            frequency,
        }
    }

    /// Oscillator for `freq_hz` at `sample_rate`
    pub fn from_hz(freq_hz: f64, sample_rate: f64) -> Self {
        Self::new((std::f64::consts::TAU * freq_hz / sample_rate) as f32)
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Adjust phase by a delta (used by the loops for phase correction)
    pub fn adjust_phase(&mut self, delta: f32) {
        self.phase = wrap_phase(self.phase + delta);
    }

    /// Unit phasor at the current phase
    pub fn phasor(&self) -> Sample {
        Sample::from_polar(1.0, self.phase)
    }

    /// Advance by one sample at the current frequency
    pub fn step(&mut self) {
        self.phase = wrap_phase(self.phase + self.frequency);
    }

    /// Current phasor, then advance
    pub fn next_phasor(&mut self) -> Sample {
        let out = self.phasor();
        self.step();
        out
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// Wrap a phase into [0, 2π)
pub fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

//! Second-order loop filter design
//!
//! Maps a normalized noise bandwidth to the proportional (α) and integral
//! (β) gains of a critically damped (ζ = √2/2) tracking loop. The PLL,
//! Costas loop and clock recovery all share this design and differ only in
//! their error detectors.

use crate::domain::Sample;

use super::nco::Nco;

/// Damping factor shared by every loop
pub const DAMPING: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Proportional and integral gains of a tracking loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopGains {
    pub alpha: f32,
    pub beta: f32,
}

impl LoopGains {
    /// Design gains for `bandwidth` (cycles/sample, or cycles/symbol for
    /// loops updated once per symbol)
    pub fn new(bandwidth: f32) -> Self {
        let (alpha, beta) = design(bandwidth);
        Self { alpha, beta }
    }
}

/// Returns `(alpha, beta)` for the given loop bandwidth
pub fn design(bandwidth: f32) -> (f32, f32) {
    let denom = 1.0 + 2.0 * DAMPING * bandwidth + bandwidth * bandwidth;
    let alpha = (4.0 * DAMPING * bandwidth) / denom;
    let beta = (4.0 * bandwidth * bandwidth) / denom;
    (alpha, beta)
}

/// Phase and frequency state of a carrier tracking loop.
///
/// Each loop owns one. The frequency estimate is clamped to
/// `±max_frequency`; a zero limit pins it at zero and leaves a phase-only
/// loop.
#[derive(Debug, Clone)]
pub struct LoopState {
    nco: Nco,
    gains: LoopGains,
    max_frequency: f32,
}

impl LoopState {
    /// `max_frequency` is in radians/sample
    pub fn new(gains: LoopGains, max_frequency: f32) -> Self {
        Self {
            nco: Nco::new(0.0),
            gains,
            max_frequency: max_frequency.abs(),
        }
    }

    /// Local oscillator at the current phase estimate
    pub fn phasor(&self) -> Sample {
        self.nco.phasor()
    }

    /// Apply one error sample: frequency += β·e, phase += frequency + α·e
    pub fn advance(&mut self, error: f32) {
        let frequency = (self.nco.frequency() + self.gains.beta * error)
            .clamp(-self.max_frequency, self.max_frequency);
        self.nco.set_frequency(frequency);
        self.nco.adjust_phase(frequency + self.gains.alpha * error);
    }

    pub fn phase(&self) -> f32 {
        self.nco.phase()
    }

    pub fn frequency(&self) -> f32 {
        self.nco.frequency()
    }

    /// Frequency estimate pinned at a non-zero clamp boundary
    pub fn is_saturated(&self) -> bool {
        self.max_frequency > 0.0 && self.nco.frequency().abs() >= self.max_frequency
    }

    pub fn reset(&mut self) {
        self.nco = Nco::new(0.0);
    }
}

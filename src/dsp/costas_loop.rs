//! Costas loop for BPSK/QPSK carrier recovery
//!
//! Same update structure as the PLL, but the phase error detector is blind
//! to the data: it is invariant under the M-fold rotations of the
//! constellation, so the loop settles on any one of the M equivalent phase
//! states. BPSK locks to the real axis, QPSK to the diagonals.
//!
//! Two detector families are available:
//!
//! - carrier present: smooth power-law detectors, Im(z²)/2 for BPSK and
//!   −Im(z⁴)/|z|⁴ for QPSK
//! - suppressed carrier: hard-decision detectors, sgn(I)·Q for BPSK and
//!   2√2·(sgn(I)·Q − sgn(Q)·I)/|z| for QPSK, which rely only on the symbol
//!   decisions and not on any energy at the carrier frequency
//!
//! The QPSK detectors are amplitude normalized with a slope of 4 at lock.

use crate::domain::{Order, Sample};

use super::loop_filter::{LoopGains, LoopState};
use super::Block;

/// Below this power the QPSK detectors report no error
const MIN_POWER: f32 = 1e-18;

/// 2√2, bringing the decision detector to the power-law slope
const QPSK_DECISION_GAIN: f32 = 2.0 * std::f32::consts::SQRT_2;

/// Costas loop for M-PSK carrier tracking and derotation
pub struct CostasLoop {
    order: Order,
    suppress_carrier: bool,
    state: LoopState,
}

impl CostasLoop {
    /// Create a new Costas loop
    ///
    /// - `order`: constellation the detector is matched to
    /// - `gains`: loop filter gains
    /// - `max_offset`: frequency clamp in radians/sample, 0 for phase-only
    /// - `suppress_carrier`: use the decision-directed detectors
    pub fn new(order: Order, gains: LoopGains, max_offset: f32, suppress_carrier: bool) -> Self {
        Self {
            order,
            suppress_carrier,
            state: LoopState::new(gains, max_offset),
        }
    }

    /// Derotate one sample and update the loop
    pub fn process(&mut self, sample: Sample) -> Sample {
        let out = sample * self.state.phasor().conj();
        let error = self.phase_error(out).clamp(-1.0, 1.0);
        self.state.advance(error);
        out
    }

    fn phase_error(&self, z: Sample) -> f32 {
        match (self.order, self.suppress_carrier) {
            (Order::Bpsk, false) => z.re * z.im,
            (Order::Bpsk, true) => sign(z.re) * z.im,
            (Order::Qpsk, suppress) => {
                let power = z.norm_sqr();
                if power < MIN_POWER {
                    return 0.0;
                }
                if suppress {
                    QPSK_DECISION_GAIN * (sign(z.re) * z.im - sign(z.im) * z.re) / power.sqrt()
                } else {
                    let zz = z * z;
                    -(zz * zz).im / (power * power)
                }
            }
        }
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

    /// Reset the loop state
    pub fn reset(&mut self) {
        self.state.reset();
    }
}

fn sign(x: f32) -> f32 {
    if x >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

impl Block for CostasLoop {
    fn name(&self) -> &'static str {
        "costas_loop"
    }

    fn work(&mut self, input: &[Sample], output: &mut Vec<Sample>) {
        output.extend(input.iter().map(|&s| self.process(s)));
    }

    fn carrier_lock(&self) -> Option<(f32, bool)> {
        Some((self.frequency(), self.is_saturated()))
    }
}

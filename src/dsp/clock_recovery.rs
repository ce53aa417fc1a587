//! Symbol timing recovery
//!
//! Gardner timing error detector driving a fractional-interval strobe
//! counter. Two strobes are taken per symbol, one at the decision instant
//! and one halfway between decisions; both are cubic-interpolated from the
//! four most recent input samples, so the samples-per-symbol ratio can be
//! any real number ≥ 2.
//!
//! The loop is updated once per symbol with gains from
//! [`loop_filter::design`](super::loop_filter::design), tracking the clock
//! period within `±max_deviation` of nominal.

use crate::domain::{Order, Sample, Symbol};

use super::loop_filter::LoopGains;
use super::Block;

/// Symbol clock recovery using a Gardner timing error detector
pub struct ClockRecovery {
    order: Order,
    /// Nominal samples per symbol
    nominal: f32,
    /// Average period estimate, samples per symbol
    period: f32,
    period_min: f32,
    period_max: f32,
    gains: LoopGains,
    /// Last four inputs, oldest first
    history: [Sample; 4],
    /// Time of the next strobe in samples, relative to `history[1]`
    next_strobe: f32,
    /// Spacing to the strobe after next
    half_step: f32,
    midpoint_due: bool,
    last_symbol: Symbol,
    midpoint: Sample,
}

impl ClockRecovery {
    /// Create a new clock recovery stage
    ///
    /// - `samples_per_symbol`: input rate over symbol rate, ≥ 2
    /// - `gains`: loop gains for a bandwidth in cycles/symbol
    /// - `max_deviation`: largest period error, fraction of nominal
    pub fn new(order: Order, samples_per_symbol: f32, gains: LoopGains, max_deviation: f32) -> Self {
        let deviation = samples_per_symbol * max_deviation.clamp(0.0, 0.5);
        Self {
            order,
            nominal: samples_per_symbol,
            period: samples_per_symbol,
            period_min: samples_per_symbol - deviation,
            period_max: samples_per_symbol + deviation,
            gains,
            history: [Sample::new(0.0, 0.0); 4],
            // First strobe (a midpoint) lands on the first input sample
            next_strobe: 2.0,
            half_step: samples_per_symbol / 2.0,
            midpoint_due: true,
            last_symbol: Sample::new(0.0, 0.0),
            midpoint: Sample::new(0.0, 0.0),
        }
    }

    /// Push one input sample, returning a symbol when a decision instant
    /// falls within the newly available interval
    pub fn process(&mut self, sample: Sample) -> Option<Symbol> {
        let mut symbols = Vec::with_capacity(1);
        self.push(sample, &mut symbols);
        symbols.pop()
    }

    fn push(&mut self, sample: Sample, symbols: &mut Vec<Symbol>) {
        self.history.rotate_left(1);
        self.history[3] = sample;

        while self.next_strobe < 1.0 {
            let strobe = interpolate(&self.history, self.next_strobe.max(0.0));
            if self.midpoint_due {
                self.midpoint = strobe;
                self.midpoint_due = false;
            } else {
                self.update_timing(strobe);
                self.last_symbol = strobe;
                self.midpoint_due = true;
                symbols.push(strobe);
            }
            self.next_strobe += self.half_step;
        }

        self.next_strobe -= 1.0;
    }

    fn update_timing(&mut self, symbol: Symbol) {
        let error = self.timing_error(symbol).clamp(-1.0, 1.0);

        self.period = (self.period + self.nominal * self.gains.beta * error)
            .clamp(self.period_min, self.period_max);
        let step = self.period + self.nominal * self.gains.alpha * error;
        self.half_step = step / 2.0;
    }

    /// Gardner detector: negative when strobes are late
    fn timing_error(&self, symbol: Symbol) -> f32 {
        let diff = self.last_symbol - symbol;
        match self.order {
            Order::Bpsk => diff.re * self.midpoint.re,
            Order::Qpsk => diff.re * self.midpoint.re + diff.im * self.midpoint.im,
        }
    }

    /// Current period estimate, samples per symbol
    pub fn period(&self) -> f32 {
        self.period
    }

    /// Period pinned at its deviation limit
    pub fn is_saturated(&self) -> bool {
        self.period_max > self.period_min
            && (self.period <= self.period_min || self.period >= self.period_max)
    }
}

/// Cubic Lagrange interpolation between `h[1]` (mu = 0) and `h[2]` (mu = 1)
fn interpolate(h: &[Sample; 4], mu: f32) -> Sample {
    let c0 = -mu * (mu - 1.0) * (mu - 2.0) / 6.0;
    let c1 = (mu + 1.0) * (mu - 1.0) * (mu - 2.0) / 2.0;
    let c2 = -(mu + 1.0) * mu * (mu - 2.0) / 2.0;
    let c3 = (mu + 1.0) * mu * (mu - 1.0) / 6.0;
    h[0] * c0 + h[1] * c1 + h[2] * c2 + h[3] * c3
}

impl Block for ClockRecovery {
    fn name(&self) -> &'static str {
        "clock_recovery"
    }

    fn work(&mut self, input: &[Sample], output: &mut Vec<Sample>) {
        for &sample in input {
            self.push(sample, output);
        }
    }

    fn clock_lock(&self) -> Option<(f32, bool)> {
        Some((self.period(), self.is_saturated()))
    }
}

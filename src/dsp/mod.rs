//! Digital Signal Processing
//!
//! Streaming stages of the demodulator chains. No I/O dependencies.

pub mod agc;
pub mod clock_recovery;
pub mod costas_loop;
pub mod dc_blocker;
pub mod filter;
pub mod loop_filter;
pub mod nco;
pub mod pll;
pub mod rrc;
pub mod spectrum;
pub mod translator;

// Re-export commonly used items
pub use agc::Agc;
pub use clock_recovery::ClockRecovery;
pub use costas_loop::CostasLoop;
pub use dc_blocker::DcBlocker;
pub use filter::FirFilter;
pub use loop_filter::{LoopGains, LoopState};
pub use nco::Nco;
pub use pll::Pll;
pub use translator::FrequencyTranslator;

use crate::domain::Sample;

/// One stage of a demodulator chain.
///
/// `work` consumes a run of samples and appends whatever the stage produces
/// (the same count for per-sample stages, fewer under decimation). Stages
/// are causal and keep only their own state, so a stream may be split into
/// runs of any length.
pub trait Block: Send {
    /// Short stage name for logs
    fn name(&self) -> &'static str;

    fn work(&mut self, input: &[Sample], output: &mut Vec<Sample>);

    /// Called once at end of stream; emit anything held back for filter
    /// history
    fn flush(&mut self, _output: &mut Vec<Sample>) {}

    /// Carrier loop frequency (radians/sample) and clamp state
    fn carrier_lock(&self) -> Option<(f32, bool)> {
        None
    }

    /// Clock period (samples/symbol) and clamp state
    fn clock_lock(&self) -> Option<(f32, bool)> {
        None
    }
}

//! Demodulator configuration
//!
//! Numeric constants shared by both chains. Defaults match the values the
//! chains were tuned with; a JSON file may override any subset of them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{DemodError, DemodResult};

/// Tunable parameters for the demodulator chains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemodConfig {
    /// DC blocker pole rate, in (0, 1)
    pub dc_blocker_rate: f32,
    /// AGC adaptation rate, in (0, 1)
    pub agc_rate: f32,
    /// AGC target output magnitude
    pub agc_reference: f32,
    /// Upper bound on AGC gain
    pub agc_max_gain: f32,
    /// Matched filter passband gain
    pub rrc_gain: f32,
    /// Matched filter roll-off, in (0, 1]
    pub rrc_roll_off: f32,
    /// Matched filter length, odd
    pub rrc_taps: usize,
    /// Carrier loop (PLL and Costas) noise bandwidth, cycles/sample
    pub carrier_loop_bandwidth: f32,
    /// Clock recovery noise bandwidth, cycles/symbol
    pub clock_loop_bandwidth: f32,
    /// Largest carrier offset the loops may track, in Hz
    pub max_carrier_offset_hz: f32,
    /// Largest clock period deviation, as a fraction of samples/symbol
    pub clock_max_deviation: f32,
    /// Samples pulled from the source per block
    pub block_size: usize,
    /// Blocks buffered between worker threads
    pub queue_depth: usize,
}

impl Default for DemodConfig {
    fn default() -> Self {
        Self {
            dc_blocker_rate: 0.001,
            agc_rate: 0.001,
            agc_reference: 0.707,
            agc_max_gain: 65536.0,
            rrc_gain: 1.0,
            rrc_roll_off: 0.6,
            rrc_taps: 51,
            carrier_loop_bandwidth: 0.005,
            clock_loop_bandwidth: 0.01,
            max_carrier_offset_hz: 150e3,
            clock_max_deviation: 0.005,
            block_size: 8192,
            queue_depth: 16,
        }
    }
}

impl DemodConfig {
    /// Load a configuration from a JSON file and validate it
    pub fn load(path: impl AsRef<Path>) -> DemodResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            DemodError::config(format!("Failed to read config '{}': {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| {
            DemodError::config(format!("Failed to parse config '{}': {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the stages cannot be built from
    pub fn validate(&self) -> DemodResult<()> {
        let unit = |name: &str, v: f32| {
            if v > 0.0 && v < 1.0 {
                Ok(())
            } else {
                Err(DemodError::config(format!("{name} must be in (0, 1), got {v}")))
            }
        };
        unit("dc_blocker_rate", self.dc_blocker_rate)?;
        unit("agc_rate", self.agc_rate)?;
        unit("carrier_loop_bandwidth", self.carrier_loop_bandwidth)?;
        unit("clock_loop_bandwidth", self.clock_loop_bandwidth)?;
        unit("clock_max_deviation", self.clock_max_deviation)?;

        if !(self.agc_reference > 0.0) {
            return Err(DemodError::config("agc_reference must be positive"));
        }
        if !(self.rrc_gain > 0.0 && self.rrc_gain.is_finite()) {
            return Err(DemodError::config(format!(
                "rrc_gain must be positive and finite, got {}",
                self.rrc_gain
            )));
        }
        if !(self.agc_max_gain > 0.0) {
            return Err(DemodError::config("agc_max_gain must be positive"));
        }
        if !(self.max_carrier_offset_hz >= 0.0) {
            return Err(DemodError::config("max_carrier_offset_hz must not be negative"));
        }
        if self.block_size == 0 || self.queue_depth == 0 {
            return Err(DemodError::config("block_size and queue_depth must be non-zero"));
        }
        // Filter parameters are checked again by the filter itself
        crate::dsp::rrc::validate(self.rrc_taps, self.rrc_roll_off)
    }
}

//! Core domain types

use num_complex::Complex32;
use serde::{Deserialize, Serialize};

/// One instant of the received signal (in-phase, quadrature)
pub type Sample = Complex32;

/// A recovered symbol, one per symbol period
pub type Symbol = Complex32;

/// Signed soft decision, one per symbol axis
pub type SoftBit = i8;

/// Which fixed stage ordering a downlink uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// DC block → PLL → translate → RRC → AGC → Costas → clock → slicer
    Biphase,
    /// DC block → RRC → AGC → Costas → clock → symbol handler
    Psk,
}

/// Modulation order handled by the carrier loop and symbol mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Bpsk,
    Qpsk,
}

impl Order {
    /// Number of constellation points
    pub fn points(self) -> usize {
        match self {
            Order::Bpsk => 2,
            Order::Qpsk => 4,
        }
    }
}

/// Totals reported when a pipeline run finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub samples_in: u64,
    pub symbols_out: u64,
    pub bytes_out: u64,
}

/// Snapshot of the tracking loops, for operator visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LockStatus {
    /// Carrier frequency estimate in radians/sample
    pub carrier_frequency: f32,
    pub carrier_saturated: bool,
    /// Current clock period estimate in samples/symbol
    pub clock_period: f32,
    pub clock_saturated: bool,
}

//! Downlink profiles
//!
//! A fixed table mapping each supported downlink name to the chain that
//! demodulates it and the collaborators that consume its output.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::{DemodError, DemodResult, Order, Topology};

/// Forward error correction the downlink expects downstream of the demodulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecoderKind {
    /// Uncoded: hard decisions are the final product
    None,
    MetopViterbi,
    FengyunViterbi,
    Fengyun3cViterbi,
}

/// Frame extraction the downlink expects downstream of the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeframerKind {
    Passthrough,
    /// CCSDS virtual channel data units
    Vcdu,
}

/// Everything needed to build a demodulator for one downlink
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Profile {
    pub name: &'static str,
    pub topology: Topology,
    /// Symbols per second
    pub symbol_rate: f64,
    pub order: Order,
    pub suppress_carrier: bool,
    pub decoder: DecoderKind,
    pub deframer: DeframerKind,
}

const PROFILES: [Profile; 6] = [
    Profile {
        name: "noaa_hrpt",
        topology: Topology::Biphase,
        symbol_rate: 665.4e3,
        order: Order::Bpsk,
        suppress_carrier: false,
        decoder: DecoderKind::None,
        deframer: DeframerKind::Passthrough,
    },
    Profile {
        name: "meteor_hrpt",
        topology: Topology::Biphase,
        symbol_rate: 665.4e3,
        order: Order::Bpsk,
        suppress_carrier: false,
        decoder: DecoderKind::None,
        deframer: DeframerKind::Passthrough,
    },
    Profile {
        name: "metop_hrpt",
        topology: Topology::Psk,
        symbol_rate: 2.3333e6,
        order: Order::Qpsk,
        suppress_carrier: false,
        decoder: DecoderKind::MetopViterbi,
        deframer: DeframerKind::Vcdu,
    },
    Profile {
        name: "fy3b_hrpt",
        topology: Topology::Psk,
        symbol_rate: 2.8e6,
        order: Order::Qpsk,
        suppress_carrier: false,
        decoder: DecoderKind::FengyunViterbi,
        deframer: DeframerKind::Vcdu,
    },
    Profile {
        name: "fy3c_hrpt",
        topology: Topology::Psk,
        symbol_rate: 2.6e6,
        order: Order::Qpsk,
        suppress_carrier: false,
        decoder: DecoderKind::Fengyun3cViterbi,
        deframer: DeframerKind::Vcdu,
    },
    Profile {
        name: "noaa_gac",
        topology: Topology::Psk,
        symbol_rate: 2.661e6,
        order: Order::Bpsk,
        suppress_carrier: true,
        decoder: DecoderKind::None,
        deframer: DeframerKind::Passthrough,
    },
];

impl Profile {
    /// Look up a downlink by name
    pub fn lookup(name: &str) -> DemodResult<Self> {
        PROFILES
            .iter()
            .find(|p| p.name == name)
            .copied()
            .ok_or_else(|| {
                let names: Vec<&str> = PROFILES.iter().map(|p| p.name).collect();
                DemodError::config(format!(
                    "Unknown downlink '{name}', must be one of {}",
                    names.join(", ")
                ))
            })
    }

    /// Every supported downlink
    pub fn all() -> &'static [Profile] {
        &PROFILES
    }

    /// True when a forward-error-correction decoder consumes the symbols
    pub fn is_coded(&self) -> bool {
        self.decoder != DecoderKind::None
    }

    pub fn samples_per_symbol(&self, sample_rate: f64) -> f64 {
        sample_rate / self.symbol_rate
    }
}

impl FromStr for Profile {
    type Err = DemodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12} {:<8} {:>9.4} Msym/s  {}-PSK{}  decoder={:?} deframer={:?}",
            self.name,
            format!("{:?}", self.topology),
            self.symbol_rate / 1e6,
            self.order.points(),
            if self.suppress_carrier { " (suppressed carrier)" } else { "" },
            self.decoder,
            self.deframer,
        )
    }
}

//! HRPT Demodulator
//!
//! Recovers carrier, symbol timing and symbols from raw complex recordings
//! of polar-orbiting weather satellite downlinks (NOAA, MetOp, FengYun,
//! Meteor).
//!
//! ## Architecture (Hexagonal / Ports & Adapters)
//!
//! - `domain/` - Pure domain types, errors and configuration
//! - `ports/` - Trait definitions for the sample source, decoder, deframer and sink
//! - `dsp/` - Streaming signal processing stages (no I/O)
//! - `modem/` - Downlink profiles, symbol handling and pipeline assembly
//! - `adapters/` - Implementations of ports (IQ files, memory, pass-through)

// Core domain (pure, no I/O)
pub mod domain;
pub mod dsp;
pub mod modem;
pub mod ports;

// Adapters (external I/O)
pub mod adapters;

pub use domain::{DemodConfig, DemodError, DemodResult};
pub use modem::{make_demod, Demodulator, DemodulatorBuilder, Profile, StopHandle};

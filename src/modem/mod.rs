//! HRPT Modem
//!
//! Downlink profiles, symbol handling and assembly of the demodulator chains

pub mod pipeline;
pub mod profile;
pub mod symbols;
pub mod threaded;

pub use pipeline::{make_demod, Demodulator, DemodulatorBuilder};
pub use profile::{DecoderKind, DeframerKind, Profile};
pub use symbols::{SymbolHandler, SymbolMode};
pub use threaded::StopHandle;

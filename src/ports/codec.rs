//! Decoder and deframer ports
//!
//! Coded downlinks hand soft symbols to a forward-error-correction decoder;
//! every downlink hands bytes to a deframer. Both are external to the
//! demodulator, which only fixes the element types they accept.

use crate::domain::SoftBit;

/// Forward error correction: soft symbols in, corrected bytes out
pub trait Decoder: Send {
    fn name(&self) -> &str;

    fn decode(&mut self, soft: &[SoftBit], out: &mut Vec<u8>);

    /// Emit anything still buffered at end of stream
    fn finish(&mut self, _out: &mut Vec<u8>) {}
}

/// Frame synchronization and extraction: bytes in, frame bytes out
pub trait Deframer: Send {
    fn name(&self) -> &str;

    fn push(&mut self, bytes: &[u8], out: &mut Vec<u8>);

    /// Emit anything still buffered at end of stream
    fn finish(&mut self, _out: &mut Vec<u8>) {}
}

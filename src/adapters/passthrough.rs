//! Identity decoder and deframer

use crate::domain::SoftBit;
use crate::ports::{Decoder, Deframer};

/// Writes soft decisions out unchanged, one signed byte each
#[derive(Debug, Default)]
pub struct PassthroughDecoder;

impl Decoder for PassthroughDecoder {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn decode(&mut self, soft: &[SoftBit], out: &mut Vec<u8>) {
        out.extend(soft.iter().map(|&s| s as u8));
    }
}

/// Forwards the byte stream without frame synchronization
#[derive(Debug, Default)]
pub struct PassthroughDeframer;

impl Deframer for PassthroughDeframer {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn push(&mut self, bytes: &[u8], out: &mut Vec<u8>) {
        out.extend_from_slice(bytes);
    }
}

//! Symbol handling
//!
//! Maps recovered symbols onto the alphabet the next collaborator expects:
//! packed hard bits for uncoded downlinks, signed soft decisions for a
//! forward-error-correction decoder.

use crate::domain::{Order, SoftBit, Symbol};

/// Hard decision for BPSK: 1 when the real part is non-negative
pub fn binary_slice(symbol: Symbol) -> u8 {
    u8::from(symbol.re >= 0.0)
}

/// Hard decision for QPSK: `(re ≥ 0) << 1 | (im ≥ 0)`
pub fn quadrant_slice(symbol: Symbol) -> u8 {
    (u8::from(symbol.re >= 0.0) << 1) | u8::from(symbol.im >= 0.0)
}

/// Soft decisions for both axes, scaled and clamped to ±127
pub fn soft_decisions(symbol: Symbol, scale: f32) -> [SoftBit; 2] {
    let quantize = |x: f32| (x * scale).round().clamp(-127.0, 127.0) as SoftBit;
    [quantize(symbol.re), quantize(symbol.im)]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SymbolMode {
    /// One bit per symbol
    Binary,
    /// Two bits per symbol
    Quadrant,
    /// Two soft decisions per symbol for a decoder
    Soft { scale: f32 },
}

impl SymbolMode {
    /// Hard-decision mode for a modulation order
    pub fn hard(order: Order) -> Self {
        match order {
            Order::Bpsk => SymbolMode::Binary,
            Order::Qpsk => SymbolMode::Quadrant,
        }
    }
}

/// Stateful symbol handler; packs hard bits MSB-first into bytes
pub struct SymbolHandler {
    mode: SymbolMode,
    shift: u8,
    bits: u8,
}

impl SymbolHandler {
    pub fn new(mode: SymbolMode) -> Self {
        Self {
            mode,
            shift: 0,
            bits: 0,
        }
    }

    /// Hard modes append to `bytes`, soft mode appends to `soft`
    pub fn handle(&mut self, symbols: &[Symbol], bytes: &mut Vec<u8>, soft: &mut Vec<SoftBit>) {
        match self.mode {
            SymbolMode::Binary => {
                for &symbol in symbols {
                    self.push_bits(binary_slice(symbol), 1, bytes);
                }
            }
            SymbolMode::Quadrant => {
                for &symbol in symbols {
                    self.push_bits(quadrant_slice(symbol), 2, bytes);
                }
            }
            SymbolMode::Soft { scale } => {
                for &symbol in symbols {
                    soft.extend_from_slice(&soft_decisions(symbol, scale));
                }
            }
        }
    }

    fn push_bits(&mut self, value: u8, width: u8, bytes: &mut Vec<u8>) {
        self.shift = (self.shift << width) | value;
        self.bits += width;
        if self.bits == 8 {
            bytes.push(self.shift);
            self.shift = 0;
            self.bits = 0;
        }
    }

    /// Emit a trailing partial byte, zero-padded in the low bits
    pub fn flush(&mut self, bytes: &mut Vec<u8>) {
        if self.bits > 0 {
            bytes.push(self.shift << (8 - self.bits));
            self.shift = 0;
            self.bits = 0;
        }
    }
}

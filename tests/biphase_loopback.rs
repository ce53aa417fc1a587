//! Integration tests: split-phase PM transmitter → biphase chain loopback
//!
//! The carrier is phase modulated by Manchester-coded bits, leaving a
//! residual carrier for the PLL to lock to. The recovered bit stream must
//! match what was sent, up to inversion and a few symbols of filter delay.

use std::f64::consts::TAU;

use hrpt_demod::adapters::{MemorySink, MemorySource};
use hrpt_demod::domain::{DemodConfig, Sample};
use hrpt_demod::make_demod;

const SYMBOL_RATE: f64 = 665.4e3;
const OVERSAMPLING: f64 = 4.3;
/// 67° phase deviation
const MODULATION_INDEX: f64 = 67.0 * TAU / 360.0;

fn bits(count: usize) -> Vec<u8> {
    let mut state = 0x2545_f491u32;
    (0..count)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 1) as u8
        })
        .collect()
}

/// Split-phase: a one is high then low, a zero low then high
fn split_phase(sent: &[u8], offset_hz: f64, phase: f64) -> Vec<Sample> {
    let sample_rate = SYMBOL_RATE * OVERSAMPLING;
    let step = TAU * offset_hz / sample_rate;
    let len = (sent.len() as f64 * OVERSAMPLING).round() as usize;
    (0..len)
        .map(|i| {
            let t = i as f64 / OVERSAMPLING;
            let k = t as usize;
            let level = if sent[k] == 1 { 1.0 } else { -1.0 };
            let chip = if t - (k as f64) < 0.5 { level } else { -level };
            let angle = MODULATION_INDEX * chip + step * i as f64 + phase;
            Sample::from_polar(0.5, angle.rem_euclid(TAU) as f32)
        })
        .collect()
}

fn unpack(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1))
        .collect()
}

/// Helper: transmit, demodulate as noaa_hrpt, return the recovered bits
fn loopback(sent: &[u8], offset_hz: f64, phase: f64) -> Vec<u8> {
    let mut demod =
        make_demod("noaa_hrpt", SYMBOL_RATE * OVERSAMPLING, &DemodConfig::default()).unwrap();
    let sink = MemorySink::new();
    demod
        .run(&mut MemorySource::new(split_phase(sent, offset_hz, phase)), &mut sink.clone())
        .unwrap();
    unpack(&sink.contents())
}

/// True when the bits after `skip` match `sent` at one lag, either polarity
fn recovered(received: &[u8], sent: &[u8], skip: usize) -> bool {
    let end = received.len().saturating_sub(16);
    (-8i64..=24).any(|lag| {
        [0u8, 1].iter().any(|&flip| {
            (skip..end).all(|i| {
                let j = i as i64 - lag;
                j < 0 || j as usize >= sent.len() || received[i] ^ flip == sent[j as usize]
            })
        })
    })
}

#[test]
fn test_biphase_loopback_with_carrier_offset() {
    let sent = bits(4000);
    let received = loopback(&sent, 5e3, 1.0);
    assert!(received.len() >= sent.len(), "only {} bits recovered", received.len());
    assert!(recovered(&received, &sent, 600), "bit sequence not recovered");
}

#[test]
fn test_biphase_loopback_offsets_and_phases() {
    let sent = bits(4000);
    for (offset, phase) in [(0.0, -2.0), (-20e3, 2.5)] {
        let received = loopback(&sent, offset, phase);
        assert!(
            recovered(&received, &sent, 600),
            "offset {offset} Hz, phase {phase}: bit sequence not recovered"
        );
    }
}

#[test]
fn test_biphase_pll_tracks_residual_carrier() {
    let sent = bits(4000);
    let sample_rate = SYMBOL_RATE * OVERSAMPLING;
    let mut demod = make_demod("noaa_hrpt", sample_rate, &DemodConfig::default()).unwrap();
    demod
        .run(&mut MemorySource::new(split_phase(&sent, -20e3, 2.5)), &mut MemorySink::new())
        .unwrap();

    let lock = demod.lock_status();
    let tracked_hz = lock.carrier_frequency as f64 * sample_rate / TAU;
    assert!((tracked_hz + 20e3).abs() < 500.0, "tracked {tracked_hz} Hz");
    assert!(!lock.carrier_saturated);
}

//! Integration tests: synthetic PSK transmitter → demodulator loopback
//!
//! A pulse-shaped BPSK or QPSK waveform with a known bit sequence is given a
//! carrier frequency and phase offset, demodulated through the PSK chain and
//! compared with what was sent. Carrier recovery leaves a phase ambiguity
//! (inversion for BPSK, a quarter turn for QPSK) and the filters add a few
//! symbols of delay, so both are searched for.

use std::f64::consts::{FRAC_1_SQRT_2, TAU};
use std::io::Write;

use num_complex::Complex64;

use hrpt_demod::adapters::{FileSink, FileSource, MemorySink, MemorySource, SampleFormat};
use hrpt_demod::domain::{DemodConfig, Sample};
use hrpt_demod::dsp::rrc::root_raised_cosine;
use hrpt_demod::{make_demod, StopHandle};

const GAC_SYMBOL_RATE: f64 = 2.661e6;
const METOP_SYMBOL_RATE: f64 = 2.3333e6;
const OVERSAMPLING: f64 = 4.3;

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

/// RRC-shaped symbols on a carrier offset by `offset_hz`, starting at `phase`
fn transmit(
    symbols: &[Complex64],
    sample_rate: f64,
    symbol_rate: f64,
    offset_hz: f64,
    phase: f64,
) -> Vec<Sample> {
    let sps = sample_rate / symbol_rate;
    let step = TAU * offset_hz / sample_rate;
    let len = (symbols.len() as f64 * sps).round() as usize;
    (0..len)
        .map(|i| {
            let t = i as f64 / sps;
            let k0 = t.floor() as i64;
            let lo = (k0 - 8).max(0) as usize;
            let hi = ((k0 + 9).max(0) as usize).min(symbols.len());
            let baseband: Complex64 = (lo..hi)
                .map(|k| symbols[k] * root_raised_cosine(t - k as f64, 0.6))
                .sum();
            let out = baseband * 0.5 * Complex64::from_polar(1.0, step * i as f64 + phase);
            Sample::new(out.re as f32, out.im as f32)
        })
        .collect()
}

fn bpsk_signal(sent: &[u8], offset_hz: f64, phase: f64) -> Vec<Sample> {
    let symbols: Vec<Complex64> = sent
        .iter()
        .map(|&b| Complex64::new(if b == 1 { 1.0 } else { -1.0 }, 0.0))
        .collect();
    transmit(&symbols, GAC_SYMBOL_RATE * OVERSAMPLING, GAC_SYMBOL_RATE, offset_hz, phase)
}

fn unpack(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1))
        .collect()
}

/// True when `same(received[i], sent[i - lag])` holds from `skip` up to the
/// flushed tail, for some lag in the search window
fn aligned<T: Copy>(received: &[T], sent: &[T], skip: usize, same: impl Fn(T, T) -> bool) -> bool {
    // The last symbols carry the truncated pulse tail and byte padding
    let end = received.len().saturating_sub(16);
    (-8i64..=24).any(|lag| {
        let compared = (skip..end)
            .filter(|&i| i as i64 - lag >= 0 && ((i as i64 - lag) as usize) < sent.len())
            .count();
        compared > 0
            && (skip..end).all(|i| {
                let j = i as i64 - lag;
                j < 0 || j as usize >= sent.len() || same(received[i], sent[j as usize])
            })
    })
}

/// Helper: transmit bits as BPSK, demodulate as noaa_gac, return the bits
fn loopback(sent: &[u8], offset_hz: f64, phase: f64) -> Vec<u8> {
    let mut demod =
        make_demod("noaa_gac", GAC_SYMBOL_RATE * OVERSAMPLING, &DemodConfig::default()).unwrap();
    let sink = MemorySink::new();
    demod
        .run(&mut MemorySource::new(bpsk_signal(sent, offset_hz, phase)), &mut sink.clone())
        .unwrap();
    unpack(&sink.contents())
}

fn bpsk_recovered(received: &[u8], sent: &[u8]) -> bool {
    aligned(received, sent, 600, |a, b| a == b) || aligned(received, sent, 600, |a, b| a != b)
}

#[test]
fn test_bpsk_loopback_with_carrier_offset() {
    let sent = bits(4000);
    let received = loopback(&sent, 5e3, 1.0);
    assert!(received.len() >= sent.len(), "only {} bits recovered", received.len());
    assert!(bpsk_recovered(&received, &sent), "bit sequence not recovered");
}

#[test]
fn test_bpsk_loopback_negative_offset_and_phases() {
    let sent = bits(4000);
    for (offset, phase) in [(-20e3, 2.5), (0.0, 3.0), (12e3, -1.2)] {
        let received = loopback(&sent, offset, phase);
        assert!(
            bpsk_recovered(&received, &sent),
            "offset {offset} Hz, phase {phase}: bit sequence not recovered"
        );
    }
}

#[test]
fn test_bpsk_carrier_estimate_matches_offset() {
    let sent = bits(4000);
    let sample_rate = GAC_SYMBOL_RATE * OVERSAMPLING;
    let mut demod = make_demod("noaa_gac", sample_rate, &DemodConfig::default()).unwrap();
    demod
        .run(&mut MemorySource::new(bpsk_signal(&sent, 5e3, 1.0)), &mut MemorySink::new())
        .unwrap();

    let lock = demod.lock_status();
    let tracked_hz = lock.carrier_frequency as f64 * sample_rate / TAU;
    assert!((tracked_hz - 5e3).abs() < 500.0, "tracked {tracked_hz} Hz");
    assert!(!lock.carrier_saturated);
    assert!((lock.clock_period as f64 - OVERSAMPLING).abs() < 0.01);
}

#[test]
fn test_threaded_loopback_matches_sequential() {
    let sent = bits(3000);
    let signal = bpsk_signal(&sent, 5e3, 1.0);
    let config = DemodConfig {
        block_size: 1000,
        queue_depth: 4,
        ..DemodConfig::default()
    };

    let mut sequential = make_demod("noaa_gac", GAC_SYMBOL_RATE * OVERSAMPLING, &config).unwrap();
    let seq_sink = MemorySink::new();
    let seq_stats = sequential
        .run(&mut MemorySource::new(signal.clone()), &mut seq_sink.clone())
        .unwrap();

    let mut threaded = make_demod("noaa_gac", GAC_SYMBOL_RATE * OVERSAMPLING, &config).unwrap();
    let thr_sink = MemorySink::new();
    let thr_stats = threaded
        .run_threaded(&mut MemorySource::new(signal), &mut thr_sink.clone(), &StopHandle::new())
        .unwrap();

    assert_eq!(seq_stats, thr_stats);
    assert_eq!(seq_sink.contents(), thr_sink.contents());
    assert!(bpsk_recovered(&unpack(&thr_sink.contents()), &sent));
}

#[test]
fn test_file_adapters_loopback() {
    let sent = bits(3000);
    let mut input = tempfile::NamedTempFile::new().unwrap();
    for sample in bpsk_signal(&sent, 5e3, 1.0) {
        input.write_all(&sample.re.to_le_bytes()).unwrap();
        input.write_all(&sample.im.to_le_bytes()).unwrap();
    }
    input.flush().unwrap();
    let output = tempfile::NamedTempFile::new().unwrap();

    let mut demod =
        make_demod("noaa_gac", GAC_SYMBOL_RATE * OVERSAMPLING, &DemodConfig::default()).unwrap();
    let mut source = FileSource::open(input.path(), SampleFormat::Cf32).unwrap();
    let mut sink = FileSink::create(output.path()).unwrap();
    let stats = demod.run(&mut source, &mut sink).unwrap();

    let written = std::fs::read(output.path()).unwrap();
    assert_eq!(written.len() as u64, stats.bytes_out);
    assert!(bpsk_recovered(&unpack(&written), &sent));
}

/// Helper: transmit bit pairs as QPSK, demodulate as metop_hrpt and check
/// the soft symbols from `skip` on against one rotation of the constellation
fn qpsk_recovered(sent: &[u8], offset_hz: f64, phase: f64, skip: usize) -> bool {
    let symbols: Vec<Complex64> = sent
        .chunks(2)
        .map(|pair| {
            let axis = |b: u8| if b == 1 { FRAC_1_SQRT_2 } else { -FRAC_1_SQRT_2 };
            Complex64::new(axis(pair[0]), axis(pair[1]))
        })
        .collect();
    let sample_rate = METOP_SYMBOL_RATE * OVERSAMPLING;
    let signal = transmit(&symbols, sample_rate, METOP_SYMBOL_RATE, offset_hz, phase);

    let mut demod = make_demod("metop_hrpt", sample_rate, &DemodConfig::default()).unwrap();
    let sink = MemorySink::new();
    let stats = demod
        .run(&mut MemorySource::new(signal), &mut sink.clone())
        .unwrap();

    // Undecoded: one signed soft byte per axis
    let soft = sink.contents();
    assert_eq!(soft.len() as u64, stats.symbols_out * 2);
    let received: Vec<(bool, bool)> = soft
        .chunks(2)
        .map(|pair| ((pair[0] as i8) >= 0, (pair[1] as i8) >= 0))
        .collect();
    let expected: Vec<(bool, bool)> = symbols.iter().map(|s| (s.re >= 0.0, s.im >= 0.0)).collect();

    // Quarter-turn rotations of the constellation, as sign patterns
    let rotations: [fn((bool, bool)) -> (bool, bool); 4] = [
        |(i, q)| (i, q),
        |(i, q)| (!q, i),
        |(i, q)| (!i, !q),
        |(i, q)| (q, !i),
    ];
    rotations
        .iter()
        .any(|rotate| aligned(&received, &expected, skip, |r, s| rotate(r) == s))
}

#[test]
fn test_qpsk_loopback_soft_symbols() {
    let sent = bits(6000);
    assert!(qpsk_recovered(&sent, 2e3, 2.2, 1000), "QPSK symbols not recovered");
}

#[test]
fn test_qpsk_loopback_pulls_in_half_clamp_offset() {
    // 75 kHz is half the default carrier clamp
    let sent = bits(12_000);
    assert!(qpsk_recovered(&sent, -75e3, 2.2, 2500), "QPSK symbols not recovered");
}

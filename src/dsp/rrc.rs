//! Root-raised-cosine matched filter
//!
//! Taps are sampled from the closed-form RRC impulse response. The two
//! removable singularities (t = 0 and t = ±T/4β) use their limiting values.
//! Taps are scaled so the DC gain equals the requested gain.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::domain::{DemodError, DemodResult};

use super::filter::FirFilter;

/// Distance from a singular point treated as the singular point itself
const SINGULARITY_EPSILON: f64 = 1e-6;

/// Check tap count and roll-off before designing a filter
pub fn validate(num_taps: usize, roll_off: f32) -> DemodResult<()> {
    if num_taps == 0 || num_taps % 2 == 0 {
        return Err(DemodError::config(format!(
            "RRC tap count must be odd and positive, got {num_taps}"
        )));
    }
    if !(roll_off > 0.0 && roll_off <= 1.0) {
        return Err(DemodError::config(format!(
            "RRC roll-off must be in (0, 1], got {roll_off}"
        )));
    }
    Ok(())
}

/// Continuous RRC impulse response at `t` symbol periods, unit symbol period
pub fn root_raised_cosine(t: f64, roll_off: f64) -> f64 {
    let beta = roll_off;
    if t.abs() < SINGULARITY_EPSILON {
        return 1.0 - beta + 4.0 * beta / PI;
    }

    let x = 4.0 * beta * t;
    if (1.0 - x * x).abs() < SINGULARITY_EPSILON {
        let arg = PI / (4.0 * beta);
        return beta * FRAC_1_SQRT_2
            * ((1.0 + 2.0 / PI) * arg.sin() + (1.0 - 2.0 / PI) * arg.cos());
    }

    let num = (PI * t * (1.0 - beta)).sin() + x * (PI * t * (1.0 + beta)).cos();
    let den = PI * t * (1.0 - x * x);
    num / den
}

/// Design the matched filter taps
pub fn make_rrc(
    gain: f32,
    sample_rate: f64,
    symbol_rate: f64,
    roll_off: f32,
    num_taps: usize,
) -> DemodResult<Vec<f32>> {
    validate(num_taps, roll_off)?;
    if !(sample_rate > 0.0 && symbol_rate > 0.0) {
        return Err(DemodError::config(format!(
            "sample rate and symbol rate must be positive, got {sample_rate} and {symbol_rate}"
        )));
    }

    let samples_per_symbol = sample_rate / symbol_rate;
    let center = (num_taps / 2) as f64;
    let taps: Vec<f64> = (0..num_taps)
        .map(|i| root_raised_cosine((i as f64 - center) / samples_per_symbol, roll_off as f64))
        .collect();

    let sum: f64 = taps.iter().sum();
    if sum.abs() < 1e-12 {
        return Err(DemodError::config("RRC taps sum to zero, cannot normalize"));
    }
    let scale = gain as f64 / sum;
    Ok(taps.iter().map(|&t| (t * scale) as f32).collect())
}

/// Matched filter as a ready-to-run FIR stage
pub fn matched_filter(
    gain: f32,
    sample_rate: f64,
    symbol_rate: f64,
    roll_off: f32,
    num_taps: usize,
) -> DemodResult<FirFilter> {
    make_rrc(gain, sample_rate, symbol_rate, roll_off, num_taps).map(FirFilter::new)
}

//! Demodulator assembly
//!
//! Builds one of the two fixed stage orderings from a downlink profile and
//! drives it to completion:
//!
//! ```text
//! PSK:     source → DC block → RRC → AGC → Costas → clock → symbols → decoder → deframer → sink
//! Biphase: source → DC block → PLL → translate → RRC → AGC → Costas(2) → clock → slicer → deframer → sink
//! ```
//!
//! Every stage is a [`Block`]; the symbol handler, decoder and deframer form
//! the back end that turns recovered symbols into bytes for the sink.

use std::f64::consts::{PI, TAU};

use crate::adapters::{PassthroughDecoder, PassthroughDeframer};
use crate::domain::{
    DemodConfig, DemodError, DemodResult, LockStatus, Order, RunStats, Sample, SoftBit, Symbol,
    Topology,
};
use crate::dsp::rrc::matched_filter;
use crate::dsp::{
    Agc, Block, ClockRecovery, CostasLoop, DcBlocker, FrequencyTranslator, LoopGains, Pll,
};
use crate::ports::{Decoder, Deframer, FrameSink, SampleSource};

use super::profile::{DeframerKind, Profile};
use super::symbols::{SymbolHandler, SymbolMode};

/// Fewest samples per symbol the clock recovery interpolator can work with
const MIN_SAMPLES_PER_SYMBOL: f64 = 2.0;

/// Build a demodulator for a named downlink with default collaborators
pub fn make_demod(
    downlink: &str,
    sample_rate: f64,
    config: &DemodConfig,
) -> DemodResult<Demodulator> {
    DemodulatorBuilder::new(downlink, sample_rate)?
        .config(config.clone())
        .build()
}

/// Builder for a [`Demodulator`] with optional injected decoder/deframer
pub struct DemodulatorBuilder {
    profile: Profile,
    sample_rate: f64,
    config: DemodConfig,
    decoder: Option<Box<dyn Decoder>>,
    deframer: Option<Box<dyn Deframer>>,
}

impl DemodulatorBuilder {
    /// Fails straight away on an unknown downlink
    pub fn new(downlink: &str, sample_rate: f64) -> DemodResult<Self> {
        Ok(Self {
            profile: Profile::lookup(downlink)?,
            sample_rate,
            config: DemodConfig::default(),
            decoder: None,
            deframer: None,
        })
    }

    pub fn config(mut self, config: DemodConfig) -> Self {
        self.config = config;
        self
    }

    /// Consume soft symbols with this decoder instead of slicing them
    pub fn decoder(mut self, decoder: Box<dyn Decoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn deframer(mut self, deframer: Box<dyn Deframer>) -> Self {
        self.deframer = Some(deframer);
        self
    }

    /// Validate everything, then construct the stages
    pub fn build(self) -> DemodResult<Demodulator> {
        let Self {
            profile,
            sample_rate,
            config,
            decoder,
            deframer,
        } = self;

        config.validate()?;
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DemodError::config(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }
        let samples_per_symbol = profile.samples_per_symbol(sample_rate);
        if samples_per_symbol < MIN_SAMPLES_PER_SYMBOL {
            return Err(DemodError::config(format!(
                "{} needs a sample rate of at least {:.0} Hz, got {sample_rate:.0} Hz",
                profile.name,
                profile.symbol_rate * MIN_SAMPLES_PER_SYMBOL
            )));
        }

        let stages = build_stages(&profile, sample_rate, &config)?;
        let backend = SymbolBackend::new(&profile, &config, decoder, deframer);

        log::info!(
            "{}: {:?} chain, {:.1} ksym/s at {:.1} ksps ({samples_per_symbol:.3} samples/symbol)",
            profile.name,
            profile.topology,
            profile.symbol_rate / 1e3,
            sample_rate / 1e3,
        );
        log::debug!(
            "Stages: {}",
            stages.iter().map(|s| s.block.name()).collect::<Vec<_>>().join(" → ")
        );

        Ok(Demodulator {
            profile,
            sample_rate,
            block_size: config.block_size,
            queue_depth: config.queue_depth,
            stages,
            backend,
        })
    }
}

fn build_stages(
    profile: &Profile,
    sample_rate: f64,
    config: &DemodConfig,
) -> DemodResult<Vec<Stage>> {
    let samples_per_symbol = profile.samples_per_symbol(sample_rate) as f32;
    let carrier_gains = LoopGains::new(config.carrier_loop_bandwidth);
    let clock_gains = LoopGains::new(config.clock_loop_bandwidth);
    let max_offset = (TAU * config.max_carrier_offset_hz as f64 / sample_rate).min(PI) as f32;
    let rrc = matched_filter(
        config.rrc_gain,
        sample_rate,
        profile.symbol_rate,
        config.rrc_roll_off,
        config.rrc_taps,
    )?;
    let agc = Agc::with_limits(config.agc_rate, config.agc_reference, 1.0, config.agc_max_gain);
    let clock = ClockRecovery::new(
        profile.order,
        samples_per_symbol,
        clock_gains,
        config.clock_max_deviation,
    );

    let blocks: Vec<Box<dyn Block>> = match profile.topology {
        Topology::Psk => vec![
            Box::new(DcBlocker::new(config.dc_blocker_rate)),
            Box::new(rrc),
            Box::new(agc),
            Box::new(CostasLoop::new(
                profile.order,
                carrier_gains,
                max_offset,
                profile.suppress_carrier,
            )),
            Box::new(clock),
        ],
        Topology::Biphase => vec![
            Box::new(DcBlocker::new(config.dc_blocker_rate)),
            Box::new(Pll::new(carrier_gains, max_offset)),
            Box::new(FrequencyTranslator::from_hz(-profile.symbol_rate, sample_rate)),
            Box::new(rrc),
            Box::new(agc),
            // The PLL has already removed the offset; only residual phase is tracked
            Box::new(CostasLoop::new(Order::Bpsk, carrier_gains, 0.0, false)),
            Box::new(clock),
        ],
    };

    Ok(blocks.into_iter().map(Stage::new).collect())
}

/// A chain stage plus its loss-of-lock bookkeeping
pub(crate) struct Stage {
    pub(crate) block: Box<dyn Block>,
    watch: LockWatch,
}

impl Stage {
    fn new(block: Box<dyn Block>) -> Self {
        Self {
            block,
            watch: LockWatch::default(),
        }
    }

    pub(crate) fn work(&mut self, input: &[Sample], output: &mut Vec<Sample>) {
        self.block.work(input, output);
        self.watch.observe(self.block.as_ref());
    }

    pub(crate) fn flush(&mut self, output: &mut Vec<Sample>) {
        self.block.flush(output);
    }
}

/// Logs transitions into and out of a loop's clamp boundary
#[derive(Default)]
struct LockWatch {
    carrier: bool,
    clock: bool,
}

impl LockWatch {
    fn observe(&mut self, block: &dyn Block) {
        if let Some((frequency, saturated)) = block.carrier_lock() {
            report(block.name(), "carrier frequency", frequency, saturated, &mut self.carrier);
        }
        if let Some((period, saturated)) = block.clock_lock() {
            report(block.name(), "clock period", period, saturated, &mut self.clock);
        }
    }
}

fn report(stage: &str, quantity: &str, value: f32, saturated: bool, was: &mut bool) {
    if saturated == *was {
        return;
    }
    if saturated {
        log::warn!("{stage}: {quantity} pinned at its limit ({value:.6}), lock lost");
    } else {
        log::info!("{stage}: {quantity} back within limits ({value:.6})");
    }
    *was = saturated;
}

/// Symbol handler, decoder and deframer: recovered symbols in, bytes out
pub(crate) struct SymbolBackend {
    handler: SymbolHandler,
    decoder: Option<Box<dyn Decoder>>,
    deframer: Box<dyn Deframer>,
    hard: Vec<u8>,
    soft: Vec<SoftBit>,
    decoded: Vec<u8>,
    frames: Vec<u8>,
}

impl SymbolBackend {
    fn new(
        profile: &Profile,
        config: &DemodConfig,
        decoder: Option<Box<dyn Decoder>>,
        deframer: Option<Box<dyn Deframer>>,
    ) -> Self {
        let decoder = decoder.or_else(|| {
            profile.is_coded().then(|| {
                log::warn!(
                    "{}: no {:?} decoder supplied, writing undecoded soft symbols",
                    profile.name,
                    profile.decoder
                );
                Box::new(PassthroughDecoder) as Box<dyn Decoder>
            })
        });
        let deframer = deframer.unwrap_or_else(|| {
            if profile.deframer != DeframerKind::Passthrough {
                log::warn!(
                    "{}: no {:?} deframer supplied, passing the stream through",
                    profile.name,
                    profile.deframer
                );
            }
            Box::new(PassthroughDeframer)
        });

        // A decoder always takes soft decisions; otherwise slice to bits
        let mode = if decoder.is_some() {
            SymbolMode::Soft {
                scale: 127.0 / config.agc_reference,
            }
        } else {
            SymbolMode::hard(profile.order)
        };
        if let Some(decoder) = &decoder {
            log::debug!("Decoder: {}, deframer: {}", decoder.name(), deframer.name());
        }

        Self {
            handler: SymbolHandler::new(mode),
            decoder,
            deframer,
            hard: Vec::new(),
            soft: Vec::new(),
            decoded: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Returns the number of bytes handed to the sink
    pub(crate) fn consume(
        &mut self,
        symbols: &[Symbol],
        sink: &mut dyn FrameSink,
    ) -> DemodResult<u64> {
        self.hard.clear();
        self.soft.clear();
        self.handler.handle(symbols, &mut self.hard, &mut self.soft);
        self.forward(false, sink)
    }

    /// Flush every layer, then finish the sink
    pub(crate) fn finish(&mut self, sink: &mut dyn FrameSink) -> DemodResult<u64> {
        self.hard.clear();
        self.soft.clear();
        self.handler.flush(&mut self.hard);
        let written = self.forward(true, sink)?;
        sink.finish()?;
        Ok(written)
    }

    fn forward(&mut self, last: bool, sink: &mut dyn FrameSink) -> DemodResult<u64> {
        self.decoded.clear();
        self.frames.clear();

        let bytes: &[u8] = match &mut self.decoder {
            Some(decoder) => {
                decoder.decode(&self.soft, &mut self.decoded);
                if last {
                    decoder.finish(&mut self.decoded);
                }
                &self.decoded
            }
            None => &self.hard,
        };
        self.deframer.push(bytes, &mut self.frames);
        if last {
            self.deframer.finish(&mut self.frames);
        }

        if self.frames.is_empty() {
            return Ok(0);
        }
        sink.write(&self.frames)?;
        Ok(self.frames.len() as u64)
    }
}

/// A fully assembled demodulator for one downlink and one stream
pub struct Demodulator {
    profile: Profile,
    sample_rate: f64,
    pub(crate) block_size: usize,
    pub(crate) queue_depth: usize,
    pub(crate) stages: Vec<Stage>,
    pub(crate) backend: SymbolBackend,
}

impl Demodulator {
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Stage names in signal order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.block.name()).collect()
    }

    /// Tracking loop state; the carrier figures come from the first carrier loop
    pub fn lock_status(&self) -> LockStatus {
        let mut status = LockStatus::default();
        let mut carrier_seen = false;
        for stage in &self.stages {
            if let Some((frequency, saturated)) = stage.block.carrier_lock() {
                if !carrier_seen {
                    status.carrier_frequency = frequency;
                    carrier_seen = true;
                }
                status.carrier_saturated |= saturated;
            }
            if let Some((period, saturated)) = stage.block.clock_lock() {
                status.clock_period = period;
                status.clock_saturated = saturated;
            }
        }
        status
    }

    /// Pull the source dry on the calling thread
    pub fn run(
        &mut self,
        source: &mut dyn SampleSource,
        sink: &mut dyn FrameSink,
    ) -> DemodResult<RunStats> {
        let mut stats = RunStats::default();
        let mut input = vec![Sample::new(0.0, 0.0); self.block_size];
        let mut next_report = 0.1;

        loop {
            let count = source.read(&mut input)?;
            if count == 0 {
                break;
            }
            stats.samples_in += count as u64;

            let symbols = run_stages(&mut self.stages, &input[..count]);
            stats.symbols_out += symbols.len() as u64;
            stats.bytes_out += self.backend.consume(&symbols, sink)?;

            if let Some(progress) = source.progress() {
                if progress >= next_report {
                    log::debug!("{:.0}% of input processed", progress * 100.0);
                    next_report = (progress / 0.1).floor() * 0.1 + 0.1;
                }
            }
        }

        // Each stage drains once, in order, through everything after it
        for i in 0..self.stages.len() {
            let (head, tail) = self.stages.split_at_mut(i + 1);
            let mut held = Vec::new();
            head[i].flush(&mut held);
            if held.is_empty() {
                continue;
            }
            let symbols = run_stages(tail, &held);
            stats.symbols_out += symbols.len() as u64;
            stats.bytes_out += self.backend.consume(&symbols, sink)?;
        }
        stats.bytes_out += self.backend.finish(sink)?;

        log_finished(&self.profile, &stats);
        Ok(stats)
    }
}

pub(crate) fn log_finished(profile: &Profile, stats: &RunStats) {
    log::info!(
        "{}: {} samples in, {} symbols, {} bytes out",
        profile.name,
        stats.samples_in,
        stats.symbols_out,
        stats.bytes_out
    );
}

fn run_stages(stages: &mut [Stage], input: &[Sample]) -> Vec<Sample> {
    let mut current = input.to_vec();
    let mut next = Vec::with_capacity(current.len());
    for stage in stages {
        next.clear();
        stage.work(&current, &mut next);
        std::mem::swap(&mut current, &mut next);
    }
    current
}

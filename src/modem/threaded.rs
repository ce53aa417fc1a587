//! Threaded execution
//!
//! One worker per stage, linked by bounded channels. A full queue blocks
//! its producer, so no sample is ever dropped. End of stream travels down
//! the chain as channel closure: each worker flushes once when its input
//! closes, then closes its own output. A failed source closes the chain
//! without flushing, and the sink is only finished after a clean run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::domain::{DemodError, DemodResult, RunStats, Sample, Symbol};
use crate::ports::{FrameSink, SampleSource};

use super::pipeline::{log_finished, Demodulator, Stage, SymbolBackend};

/// Requests early termination of a threaded run
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The source stops reading at its next block; buffered samples still drain
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Demodulator {
    /// Run with the source and every stage on their own threads; the back
    /// end and sink stay on the calling thread.
    ///
    /// Produces exactly the bytes [`run`](Demodulator::run) would.
    pub fn run_threaded(
        &mut self,
        source: &mut dyn SampleSource,
        sink: &mut dyn FrameSink,
        stop: &StopHandle,
    ) -> DemodResult<RunStats> {
        let block_size = self.block_size;
        let depth = self.queue_depth;
        let stages = &mut self.stages;
        let backend = &mut self.backend;

        let aborted = AtomicBool::new(false);
        let aborted = &aborted;

        let stats = thread::scope(|scope| -> DemodResult<RunStats> {
            let (tx, mut rx) = bounded::<Vec<Sample>>(depth);
            let reader = scope.spawn(move || {
                let read = read_source(source, &tx, block_size, stop);
                // Must be raised before the channel closes
                if read.is_err() {
                    aborted.store(true, Ordering::SeqCst);
                }
                drop(tx);
                read
            });

            let mut workers = Vec::with_capacity(stages.len());
            for stage in stages.iter_mut() {
                let (next_tx, next_rx) = bounded(depth);
                let input = std::mem::replace(&mut rx, next_rx);
                let name = stage.block.name();
                workers.push((
                    name,
                    scope.spawn(move || run_stage(stage, input, next_tx, aborted)),
                ));
            }

            let drained = drain(backend, rx, sink);

            // Join everything before reporting, so no worker outlives an error
            let samples_in = join("source", reader);
            let stage_results: Vec<DemodResult<()>> = workers
                .into_iter()
                .map(|(name, handle)| join(name, handle))
                .collect();

            let samples_in = samples_in?;
            stage_results.into_iter().collect::<DemodResult<Vec<()>>>()?;
            let (symbols_out, mut bytes_out) = drained?;
            bytes_out += backend.finish(sink)?;

            Ok(RunStats {
                samples_in,
                symbols_out,
                bytes_out,
            })
        })?;

        log_finished(self.profile(), &stats);
        Ok(stats)
    }
}

fn join<T>(name: &str, handle: ScopedJoinHandle<'_, DemodResult<T>>) -> DemodResult<T> {
    handle
        .join()
        .map_err(|_| DemodError::Pipeline(format!("{name} worker panicked")))?
}

fn read_source(
    source: &mut dyn SampleSource,
    output: &Sender<Vec<Sample>>,
    block_size: usize,
    stop: &StopHandle,
) -> DemodResult<u64> {
    log::debug!("source worker started");
    let mut total = 0u64;
    while !stop.is_stopped() {
        let mut block = vec![Sample::new(0.0, 0.0); block_size];
        let count = source.read(&mut block)?;
        if count == 0 {
            break;
        }
        block.truncate(count);
        total += count as u64;
        if output.send(block).is_err() {
            break;
        }
    }
    if stop.is_stopped() {
        log::info!("Stop requested after {total} samples");
    }
    log::debug!("source worker finished");
    Ok(total)
}

fn run_stage(
    stage: &mut Stage,
    input: Receiver<Vec<Sample>>,
    output: Sender<Vec<Sample>>,
    aborted: &AtomicBool,
) -> DemodResult<()> {
    let name = stage.block.name();
    log::debug!("{name} worker started");

    for block in input.iter() {
        let mut produced = Vec::with_capacity(block.len());
        stage.work(&block, &mut produced);
        if !produced.is_empty() && output.send(produced).is_err() {
            log::debug!("{name} worker stopping, downstream closed");
            return Ok(());
        }
    }

    if aborted.load(Ordering::SeqCst) {
        log::debug!("{name} worker stopping without flush, source failed");
        return Ok(());
    }
    let mut held = Vec::new();
    stage.flush(&mut held);
    if !held.is_empty() && output.send(held).is_err() {
        log::debug!("{name} flush discarded, downstream closed");
    }
    log::debug!("{name} worker finished");
    Ok(())
}

/// Feed recovered symbols through the back end until the chain closes.
/// The back end is finished by the caller once every worker succeeded.
fn drain(
    backend: &mut SymbolBackend,
    input: Receiver<Vec<Symbol>>,
    sink: &mut dyn FrameSink,
) -> DemodResult<(u64, u64)> {
    let mut symbols = 0u64;
    let mut bytes = 0u64;
    for block in input.iter() {
        symbols += block.len() as u64;
        bytes += backend.consume(&block, sink)?;
    }
    Ok((symbols, bytes))
}

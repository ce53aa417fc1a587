//! `hrpt-demod`: demodulate a raw IQ recording into a bit/soft-symbol file

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use hrpt_demod::adapters::{FileSink, FileSource, SampleFormat};
use hrpt_demod::{make_demod, DemodConfig, DemodError, DemodResult, Profile, StopHandle};

#[derive(Debug, Parser)]
#[command(version, about = "Demodulate HRPT satellite downlinks from raw IQ recordings")]
struct Cli {
    /// Downlink profile, see --list
    #[arg(short, long, required_unless_present = "list")]
    downlink: Option<String>,
    /// Sample rate of the recording in Hz
    #[arg(short, long = "samplerate", required_unless_present = "list")]
    samplerate: Option<f64>,
    /// Sample encoding: cf32, cs16, cu8 or cs8
    #[arg(short, long, default_value = "cf32")]
    format: SampleFormat,
    /// JSON file overriding the demodulator defaults
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Run each stage on its own thread
    #[arg(short, long)]
    threaded: bool,
    /// Print the supported downlinks and exit
    #[arg(long)]
    list: bool,
    /// Raw IQ recording
    #[arg(required_unless_present = "list")]
    input: Option<PathBuf>,
    /// Output file for demodulated bytes
    #[arg(required_unless_present = "list")]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.list {
        for profile in Profile::all() {
            println!("{profile}");
        }
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("hrpt-demod: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> DemodResult<()> {
    let (Some(downlink), Some(sample_rate), Some(input), Some(output)) =
        (&cli.downlink, cli.samplerate, &cli.input, &cli.output)
    else {
        return Err(DemodError::config(
            "--downlink, --samplerate, input and output are required",
        ));
    };

    let config = match &cli.config {
        Some(path) => DemodConfig::load(path)?,
        None => DemodConfig::default(),
    };

    // Build first so a bad profile or rate never touches the filesystem
    let mut demod = make_demod(downlink, sample_rate, &config)?;
    let mut source = FileSource::open(input, cli.format)?;
    let mut sink = FileSink::create(output)?;

    let stats = if cli.threaded {
        demod.run_threaded(&mut source, &mut sink, &StopHandle::new())?
    } else {
        demod.run(&mut source, &mut sink)?
    };

    let lock = demod.lock_status();
    log::info!(
        "Final carrier {:.1} Hz{}, clock {:.4} samples/symbol{}",
        lock.carrier_frequency as f64 * sample_rate / std::f64::consts::TAU,
        if lock.carrier_saturated { " (at limit)" } else { "" },
        lock.clock_period,
        if lock.clock_saturated { " (at limit)" } else { "" },
    );
    log::info!("Wrote {} bytes to {}", stats.bytes_out, output.display());
    Ok(())
}

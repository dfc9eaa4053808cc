use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use aggregator::{MalformedPolicy, Options, TrailingLine, config::DEFAULT_BUFFER_CAPACITY, report};
use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum, arg};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Trailing {
    Process,
    Drop,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnMalformed {
    Abort,
    Skip,
}

/// Per-station min/mean/max over a `<station>;<value>` file.
#[derive(Parser, Debug)]
struct Args {
    #[arg(default_value = "measurements.txt")]
    input: PathBuf,

    #[arg(long, default_value_t = DEFAULT_BUFFER_CAPACITY)]
    buffer_size: usize,

    /// What to do with a last line that has no newline.
    #[arg(long, value_enum, default_value_t = Trailing::Process)]
    trailing_line: Trailing,

    /// What to do with a line that does not parse.
    #[arg(long, value_enum, default_value_t = OnMalformed::Abort)]
    on_malformed: OnMalformed,

    /// Skip per-digit validation of values.
    #[arg(long)]
    trusted: bool,

    /// Write a flamegraph of the run to this file.
    #[arg(long)]
    cpuprofile: Option<PathBuf>,

    /// Log ingestion counters.
    #[arg(long)]
    stats: bool,
}

impl Args {
    fn options(&self) -> Options {
        Options::default()
            .buffer_capacity(self.buffer_size)
            .trailing_line(match self.trailing_line {
                Trailing::Process => TrailingLine::Process,
                Trailing::Drop => TrailingLine::Drop,
            })
            .on_malformed(match self.on_malformed {
                OnMalformed::Abort => MalformedPolicy::Abort,
                OnMalformed::Skip => MalformedPolicy::Skip,
            })
            .validate(!self.trusted)
    }
}

fn run(args: &Args) -> Result<Vec<u8>> {
    let ingested = aggregator::aggregate_path(&args.input, &args.options())
        .with_context(|| format!("aggregating {}", args.input.display()))?;
    if ingested.table.is_empty() {
        warn!(input = %args.input.display(), "no records");
    }
    if args.stats {
        let s = ingested.stats;
        info!(
            bytes = s.bytes,
            batches = s.batches,
            records = s.records,
            skipped = s.skipped,
            stations = ingested.table.len(),
            "stats"
        );
    }
    Ok(report::generate(&ingested.table))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.stats { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    if args.input.as_os_str().is_empty() {
        bail!("input path is missing");
    }

    let guard = match &args.cpuprofile {
        Some(_) => Some(
            pprof::ProfilerGuardBuilder::default()
                .frequency(1000)
                .blocklist(&["libc", "libgcc", "pthread", "vdso"])
                .build()
                .context("starting profiler")?,
        ),
        None => None,
    };

    let report = run(&args)?;

    if let (Some(guard), Some(path)) = (guard, &args.cpuprofile) {
        let profile = guard.report().build().context("building profile")?;
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        profile.flamegraph(file).context("writing flamegraph")?;
    }

    let mut stdout = io::stdout().lock();
    stdout.write_all(&report)?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;
    Ok(())
}

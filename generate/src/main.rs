//! Writes synthetic `<station>;<value>` measurement files.

use aggregator::Tenths;
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

const STD_DEV: f64 = 10.0;

// (name, mean annual temperature)
const STATIONS: &[(&str, f64)] = &[
    ("Abha", 18.0),
    ("Abidjan", 26.0),
    ("Addis Ababa", 16.0),
    ("Alexandria", 20.0),
    ("Anchorage", 2.8),
    ("Bangkok", 28.6),
    ("Beijing", 12.9),
    ("Berlin", 10.3),
    ("Cape Town", 16.2),
    ("Dakar", 24.0),
    ("Dikson", -11.1),
    ("Hamburg", 9.7),
    ("Ḩamīdīyeh", 24.3),
    ("Istanbul", 13.9),
    ("Jakarta", 26.7),
    ("Kuopio", 3.4),
    ("Lhasa", 7.6),
    ("Murmansk", 0.6),
    ("New York", 12.9),
    ("Nuuk", -1.4),
    ("Oslo", 5.7),
    ("Paris", 12.3),
    ("Reykjavík", 4.3),
    ("São Paulo", 19.7),
    ("Yakutsk", -8.8),
    ("Zürich", 9.3),
];

/// Writes synthetic `<station>;<value>` lines.
#[derive(Parser, Debug)]
struct Args {
    /// Number of lines to write.
    rows: u64,

    #[arg(default_value = "measurements.txt")]
    output: PathBuf,

    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let dists = STATIONS
        .iter()
        .map(|&(name, mean)| {
            Normal::new(mean, STD_DEV)
                .map(|d| (name, d))
                .map_err(|e| anyhow!("normal({mean}, {STD_DEV}): {e}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut out = BufWriter::with_capacity(1 << 20, file);
    let mut line = Vec::with_capacity(64);
    for _ in 0..args.rows {
        let (name, dist) = &dists[rng.random_range(0..dists.len())];
        let sample: f64 = dist.sample(&mut rng);
        let tenths = (sample * 10.0).round().clamp(-999.0, 999.0) as i16;
        let value = Tenths::new(tenths).ok_or_else(|| anyhow!("{tenths} out of range"))?;

        line.clear();
        line.extend_from_slice(name.as_bytes());
        line.push(b';');
        value.encode_into(&mut line);
        line.push(b'\n');
        out.write_all(&line)?;
    }
    out.flush()?;
    Ok(())
}

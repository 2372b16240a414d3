//! Feeds a `;`-delimited `id;count` dataset into a sketch and scores the
//! estimates of the first records against their exact counts.
//!
//! ```text
//! RUST_LOG=info cargo run --release --example zipf -- zipf.csv
//! ```
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use multiplicity_estimator::{Sketch, SketchError};
use tabled::settings::{Settings, Style};
use tabled::{Table, Tabled};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Number of leading records tracked exactly
const TRACKED: usize = 10;

#[derive(Parser, Debug)]
#[command(about = "Scores multiplicity estimates against exact counts of an `id;count` dataset")]
struct Args {
    /// Path to the `;`-delimited dataset
    #[arg(default_value = "zipf.csv")]
    path: PathBuf,
    /// Bitmap length in bits
    #[arg(short, long, default_value_t = 80_000_000)]
    l: u64,
    /// Number of rows
    #[arg(short, long, default_value_t = 64)]
    m: u64,
    /// Maximum column depth
    #[arg(short, long, default_value_t = 32)]
    w: u64,
}

/// Parse an `id;count` line into its `flow-<id>` key and insertion count
fn parse_record(line: &str, line_no: usize) -> anyhow::Result<(String, u64)> {
    let mut fields = line.split(';');
    let (Some(id), Some(count)) = (fields.next(), fields.next()) else {
        bail!("line {line_no}: expected `id;count`");
    };
    let parsed: f64 = count
        .trim()
        .parse()
        .with_context(|| format!("line {line_no}: bad count {count:?}"))?;
    // fractional counts round up
    Ok((format!("flow-{}", id.trim()), parsed.ceil() as u64))
}

#[derive(Tabled)]
struct Row {
    id: String,
    expected: u64,
    estimate: u64,
    error_pct: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let reader = BufReader::new(
        File::open(&args.path).with_context(|| format!("opening {}", args.path.display()))?,
    );

    info!(l = args.l, m = args.m, w = args.w, "building sketch");
    let mut sketch = Sketch::new(args.l, args.m, args.w)?;
    let mut exact: BTreeMap<String, u64> = BTreeMap::new();

    // header line is skipped
    for (line_no, line) in reader.lines().enumerate().skip(1) {
        let (id, count) = parse_record(&line?, line_no + 1)?;
        for _ in 0..count {
            sketch.count(&id)?;
        }
        if line_no <= TRACKED {
            *exact.entry(id).or_default() += count;
        }
    }

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    for (id, &expected) in &exact {
        let estimate = match sketch.estimate(id) {
            Ok(estimate) => estimate,
            Err(e @ SketchError::UninitializedEstimate) => {
                warn!(%id, "{e}, reported as 0");
                0
            }
            Err(e) => return Err(e.into()),
        };
        let error = 100.0 * (estimate as f64 - expected as f64).abs() / expected as f64;
        errors.push(error);
        rows.push(Row {
            id: id.clone(),
            expected,
            estimate,
            error_pct: format!("{error:.2}"),
        });
    }

    let table_config = Settings::default().with(Style::markdown());
    println!("{}", Table::new(rows).with(table_config));

    if !errors.is_empty() {
        let n = errors.len() as f64;
        let min = errors.iter().copied().fold(f64::INFINITY, f64::min);
        let max = errors.iter().copied().fold(0.0, f64::max);
        let mean = errors.iter().sum::<f64>() / n;
        let var = errors.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / (n - 1.0).max(1.0);
        println!(
            "error %: min/max/mean/std {min:.2} / {max:.2} / {mean:.2} / {:.2}",
            var.sqrt()
        );
    }
    println!("fill rate: {:.6}", sketch.fill_rate());
    Ok(())
}

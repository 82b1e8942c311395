use anyhow::{Context, Result};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::io::{self, Write};
use std::time::Instant;
use tracing::{error, info, warn};

use aggwalk::config::{AppConfig, OutputFormat};
use aggwalk::source::load_aggregations;
use aggwalk::{tablify_with, Frame, Record, WalkOptions};

fn flatten_input(input: &str, section: &str, options: &WalkOptions) -> aggwalk::Result<Vec<Record>> {
    let aggregations = load_aggregations(input, section)?;
    Ok(tablify_with(&aggregations, options))
}

fn emit(out: &mut impl Write, input: &str, records: &[Record], cfg: &AppConfig) -> Result<()> {
    match cfg.output {
        OutputFormat::Table => {
            let frame = Frame::from_records(records)
                .with_context(|| format!("building table for {input}"))?;
            writeln!(out, "{input} ({} rows)", frame.num_rows())?;
            writeln!(out, "{}", frame.head(cfg.head).to_table_string())?;
        }
        OutputFormat::Jsonl => {
            for record in records {
                serde_json::to_writer(&mut *out, record)?;
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let mut cfg = AppConfig::load().context("loading configuration")?;
    let _guard = aggwalk::log::init(cfg.log_dir.as_deref());

    // Paths on the command line replace the configured list
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        cfg.inputs = args;
    }

    if cfg.inputs.is_empty() {
        warn!("no inputs: pass response files as arguments, set `inputs` in aggwalk.toml or AGGWALK_INPUTS");
        return Ok(());
    }

    // ─────────────────────────────────────────────
    // Flatten every input on its own rayon worker
    // ─────────────────────────────────────────────
    let mut builder = ThreadPoolBuilder::new();
    if let Some(threads) = cfg.num_threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build().context("building worker pool")?;

    let options = cfg.walk_options();
    let start = Instant::now();
    info!(inputs = cfg.inputs.len(), threads = pool.current_num_threads(), ?options, "flattening responses");

    let results: Vec<(&String, aggwalk::Result<Vec<Record>>)> = pool.install(|| {
        cfg.inputs
            .par_iter()
            .map(|input| (input, flatten_input(input, &cfg.section, &options)))
            .collect()
    });

    // ─────────────────────────────────────────────
    // Report in input order
    // ─────────────────────────────────────────────
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failed = 0usize;
    let mut total = 0usize;

    for (input, result) in &results {
        match result {
            Ok(records) => {
                total += records.len();
                info!(input = %input, records = records.len(), "flattened");
                emit(&mut out, input, records, &cfg)?;
            }
            Err(e) => {
                failed += 1;
                error!(input = %input, error = %e, "failed to flatten");
            }
        }
    }
    out.flush()?;

    let elapsed = start.elapsed();
    info!(
        "🏁 Completed {} records from {} inputs in {:.2}s",
        total,
        results.len() - failed,
        elapsed.as_secs_f64()
    );

    if failed > 0 {
        anyhow::bail!("{failed} of {} inputs failed", results.len());
    }
    Ok(())
}

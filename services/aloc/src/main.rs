//! ALOC preparation service.
//!
//! Scans an input directory of `.grd`/`.gri` layers, aligns and normalizes
//! them onto a common grid and writes the run log and extents side file
//! that the classification stage picks up.

mod pipeline;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use layer_stack::StackConfig;
use pipeline::{PipelineOptions, PreparePipeline};

#[derive(Parser, Debug)]
#[command(name = "aloc")]
#[command(about = "Align raster layers into a classification dataset")]
struct Args {
    /// Directory containing the input layers
    #[arg(short, long, env = "ALOC_INPUT_DIR")]
    input_dir: PathBuf,

    /// Number of groups the classification will ask for. Validated and
    /// recorded in the run log; classification itself runs downstream.
    #[arg(short, long, default_value_t = 10)]
    groups: usize,

    /// Worker threads (default: ALOC_THREADS or available parallelism)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Directory for the run log and outputs
    #[arg(short, long, env = "ALOC_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);

    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    info!("Starting ALOC preparation");

    let mut config = StackConfig::from_env();
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    config
        .validate()
        .map_err(layer_stack::StackError::config)
        .context("invalid configuration")?;
    info!(
        threads = config.threads,
        pieces = config.pieces(),
        read_block_bytes = config.read_block_bytes,
        "Loaded configuration"
    );

    if args.groups < 2 {
        anyhow::bail!("at least two groups are required, got {}", args.groups);
    }

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("cannot create {}", args.output_dir.display()))?;

    let pipeline = PreparePipeline::new(
        config,
        PipelineOptions {
            input_dir: args.input_dir,
            output_dir: args.output_dir,
            groups: args.groups,
        },
    );
    let summary = pipeline.run()?;

    info!(
        layers = summary.layers,
        excluded = summary.excluded,
        cells = summary.cells,
        chunks = summary.chunks,
        "Preparation complete"
    );

    Ok(())
}

//! CLI wrapper:
//!   route-income --commissions rules.csv --deal draft.json > report.csv
//!   route-income --commissions rules.csv --deal draft.json --edits edits.jsonl --format json

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use route_income::{Engine, input, report};
use std::{
    fs::File,
    io::{self, BufReader, Write},
    path::PathBuf,
};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "route-income", version, about = "Recompute route and transaction income for a deal draft")]
struct Cli {
    /// Commission rules CSV
    #[arg(long, value_name = "FILE")]
    commissions: PathBuf,

    /// Deal draft JSON
    #[arg(long, value_name = "FILE")]
    deal: PathBuf,

    /// Edits to replay, one JSON object per line
    #[arg(long, value_name = "FILE")]
    edits: Option<PathBuf>,

    /// Report destination (defaults to stdout)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "csv")]
    format: Format,

    /// trace, debug, info, warn or error
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: Level,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ---------------------------------------------------------------- logging
    // logs go to STDERR, STDOUT carries the report
    let subscriber = FmtSubscriber::builder()
        .with_target(false)
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("installing log subscriber")?;

    // ---------------------------------------------------------------- ingest
    let rules = File::open(&cli.commissions)
        .with_context(|| format!("opening {}", cli.commissions.display()))?;
    let book = input::read_commissions(rules)?;

    let deal = File::open(&cli.deal).with_context(|| format!("opening {}", cli.deal.display()))?;
    let draft = input::read_draft(BufReader::new(deal))?;

    let mut engine = Engine::new(book, draft);

    if let Some(path) = &cli.edits {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let edits = input::read_edits(BufReader::new(file))?;
        let count = edits.len();
        for edit in edits {
            engine.process(edit);
        }
        info!("Replayed {count} edits");
    }

    let summary = engine.summary();
    info!(
        groups = engine.groups().len(),
        total_amount_for_client = %summary.total_amount_for_client,
        total_final_income = ?summary.total_final_income,
        "Recomputed deal"
    );

    // ---------------------------------------------------------------- emit
    let sink: Box<dyn Write> = match &cli.output {
        Some(p) => Box::new(File::create(p).with_context(|| format!("creating {}", p.display()))?),
        None => Box::new(io::stdout()),
    };

    match cli.format {
        Format::Csv => report::write_csv(sink, &engine),
        Format::Json => report::write_json(sink, &engine),
    }
}

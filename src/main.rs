use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tagtree::{RuleSet, TaggerError, WriterSink, tag_corpus};
use tracing::{error, info};

/// Tag dot-delimited metric names by rule and propagate the tags through the
/// naming hierarchy.
#[derive(Debug, Parser)]
#[command(name = "tagtree", version, about)]
struct Cli {
    /// TOML rule file (`[[tag]]` tables)
    #[arg(long, short)]
    rules: PathBuf,

    /// Metric corpus: a sequence of uvarint length-prefixed paths
    #[arg(long, short, default_value = "tree.bin")]
    tree: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), TaggerError> {
    info!("tagtree v{}", env!("CARGO_PKG_VERSION"));

    let ruleset = RuleSet::from_file(&cli.rules)?;
    info!(rules = %ruleset, "loaded {}", cli.rules.display());

    let start = Instant::now();
    let buf = std::fs::read(&cli.tree)?;
    info!(bytes = buf.len(), elapsed = ?start.elapsed(), "read {}", cli.tree.display());

    let stdout = io::stdout();
    let mut sink = WriterSink::new(BufWriter::new(stdout.lock()));
    let report = tag_corpus(&ruleset, &buf, &mut sink)?;
    sink.into_inner().flush()?;

    info!(
        metrics = report.metrics(),
        tagged = report.tagged(),
        down = report.propagation().down,
        up = report.propagation().up,
        "done"
    );
    Ok(())
}

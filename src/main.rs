//! ipidbench — concurrent IPv4 Identification selection benchmark.
//!
//! Replays a packet trace against one IPID assignment algorithm across an
//! increasing number of pinned worker threads and records how many
//! identifiers each thread manages to assign per trial. Run
//! `ipidbench --help` for usage.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod cli;
mod trace;
mod writer;

use cli::Cli;
use ipid_core::TrialConfig;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let cli = Cli::parse();

    if cli.help {
        // clap's own `--help` handler exits 0; this tool's contract is exit 1.
        Cli::command().print_long_help()?;
        println!();
        std::process::exit(1);
    }

    let cpus = ipid_core::affinity::available_cpus()?;
    cli.validate(cpus.len())?;

    let method = ipid_core::MethodKind::parse(&cli.method, cli.arg)?;
    let packets = std::sync::Arc::new(trace::load(&cli.trace)?);
    tracing::info!(
        method = %cli.method,
        arg = cli.arg,
        packets = packets.len(),
        cpu_range = format!("1..={}", cli.max_cpus),
        trials = cli.trials,
        warmup_ms = cli.warmup_ms,
        trial_secs = cli.duration_secs,
        "starting sweep"
    );

    let writer = writer::Writer::new(&cli.results_dir, method)?;
    let trial_cfg = TrialConfig { warmup_ms: cli.warmup_ms, trial_secs: cli.duration_secs };

    ipid_core::run(method, packets, &cpus, cli.max_cpus, cli.trials, &trial_cfg, &mut |n, matrix| {
        let total: u64 = matrix.iter().flatten().sum();
        let min = matrix.iter().flatten().min().copied().unwrap_or(0);
        let max = matrix.iter().flatten().max().copied().unwrap_or(0);
        tracing::info!(cpus = n, total, min, max, "trial batch complete");
        writer.write(n, matrix)
    })?;

    Ok(())
}

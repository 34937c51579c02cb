//! CLI surface for ipidbench.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[clap(
    name = "ipidbench",
    disable_help_flag = true,
    about = "Benchmarks the throughput of IPv4 Identification selection algorithms under concurrent load",
    long_about = None
)]
pub struct Cli {
    /// Packet trace CSV path
    #[clap(short = 'f', default_value = "packets.csv")]
    pub trace: PathBuf,

    /// Results directory (created if missing)
    #[clap(short = 'r', default_value = "results")]
    pub results_dir: PathBuf,

    /// Method name: global, perconn, perdest, perbucketl, perbucketm,
    /// prngqueue, prngshuffle, prngpure, perbucketshuffle
    #[clap(short = 'm', default_value = "global")]
    pub method: String,

    /// Method-specific numeric argument
    #[clap(short = 'a', default_value_t = 4096)]
    pub arg: usize,

    /// Trials per CPU count
    #[clap(short = 't', default_value_t = 1)]
    pub trials: usize,

    /// Trial duration, seconds
    #[clap(short = 'd', default_value_t = 5)]
    pub duration_secs: u64,

    /// Warmup duration, milliseconds
    #[clap(short = 'w', default_value_t = 100)]
    pub warmup_ms: u64,

    /// Max CPU count
    #[clap(short = 'c', default_value_t = 4)]
    pub max_cpus: usize,

    /// Print help and exit
    #[clap(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

impl Cli {
    /// Validates the trial/warmup/CPU bounds from the original spec's
    /// argument-validation table. Per-method `-a` range checks happen in
    /// [`ipid_core::MethodKind::parse`], not here.
    pub fn validate(&self, available_cpus: usize) -> Result<()> {
        if self.trials < 1 {
            bail!("-t (trials) must be >= 1, got {}", self.trials);
        }
        if self.duration_secs < 1 {
            bail!("-d (trial duration) must be >= 1 second, got {}", self.duration_secs);
        }
        let max_warmup = self.duration_secs.saturating_mul(500);
        if self.warmup_ms < 10 || self.warmup_ms > max_warmup {
            bail!(
                "-w (warmup) must be in [10, d*500] = [10, {}], got {}",
                max_warmup,
                self.warmup_ms
            );
        }
        if self.max_cpus < 1 || self.max_cpus > available_cpus {
            bail!(
                "-c (max CPU count) must be in [1, {}] (available CPUs), got {}",
                available_cpus,
                self.max_cpus
            );
        }
        Ok(())
    }
}

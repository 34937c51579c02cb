//! Spawns pinned worker threads, warms them up, times them, and collects
//! per-thread assignment counts.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::affinity::pin_current_thread;
use crate::method::IpidMethod;
use crate::packet::Packet;

pub struct TrialConfig {
    pub warmup_ms: u64,
    pub trial_secs: u64,
}

/// Runs one trial of `method` across `cpus.len()` threads, each pinned to
/// its corresponding CPU, over the shared `packets` vector.
///
/// Returns one count per thread, ordered by thread index (`cpus[t]` is
/// thread `t`'s CPU). `M` is resolved to a concrete type at the call site so
/// the worker loop calls a monomorphized `assign`, never a vtable.
pub fn run_trial<M>(method: Arc<M>, packets: Arc<Vec<Packet>>, cpus: &[usize], cfg: &TrialConfig) -> Result<Vec<u64>>
where
    M: IpidMethod + 'static,
{
    let warmup = Duration::from_millis(cfg.warmup_ms);
    let duration = Duration::from_secs(cfg.trial_secs);

    let mut handles = Vec::with_capacity(cpus.len());
    for (thread_id, &cpu) in cpus.iter().enumerate() {
        let method = method.clone();
        let packets = packets.clone();
        let handle = std::thread::Builder::new()
            .name(format!("ipid-worker-{thread_id}"))
            .spawn(move || -> Result<u64> { worker_loop(&*method, &packets, thread_id, cpu, warmup, duration) })
            .with_context(|| format!("failed to spawn worker thread for cpu {cpu}"))?;
        handles.push(handle);
    }

    let mut counts = Vec::with_capacity(handles.len());
    for handle in handles {
        let count = handle
            .join()
            .map_err(|_| anyhow::anyhow!("worker thread panicked during trial"))??;
        counts.push(count);
    }
    Ok(counts)
}

fn worker_loop<M: IpidMethod>(
    method: &M,
    packets: &[Packet],
    thread_id: usize,
    cpu: usize,
    warmup: Duration,
    duration: Duration,
) -> Result<u64> {
    pin_current_thread(cpu)?;

    if packets.is_empty() {
        anyhow::bail!("packet trace is empty; nothing to replay");
    }

    let mut rng = SmallRng::from_entropy();
    let mut idx = rng.gen_range(0..packets.len());

    let warmup_start = Instant::now();
    while warmup_start.elapsed() < warmup {
        method.assign(&packets[idx], thread_id);
        idx = (idx + 1) % packets.len();
    }

    let mut count = 0u64;
    let measure_start = Instant::now();
    while measure_start.elapsed() < duration {
        method.assign(&packets[idx], thread_id);
        idx = (idx + 1) % packets.len();
        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::PerConnection;

    #[test]
    fn single_thread_trial_produces_positive_count() {
        let method = Arc::new(PerConnection::new());
        let packets = Arc::new(vec![Packet::new(1, 2, 3, 4, 5)]);
        let cpus = crate::affinity::available_cpus().expect("CPU enumeration should succeed in CI");
        let cfg = TrialConfig { warmup_ms: 10, trial_secs: 1 };
        let counts = run_trial(method, packets, &cpus[..1], &cfg).expect("trial should run");
        assert_eq!(counts.len(), 1);
        assert!(counts[0] > 0);
    }

    #[test]
    fn multi_thread_trial_gives_every_thread_a_count() {
        let n = crate::affinity::available_cpus().map(|c| c.len()).unwrap_or(1).min(2);
        let method = Arc::new(PerConnection::new());
        let packets = Arc::new(vec![Packet::new(1, 2, 3, 4, 5), Packet::new(5, 6, 7, 8, 17)]);
        let cpus = crate::affinity::available_cpus().expect("CPU enumeration should succeed in CI");
        let cfg = TrialConfig { warmup_ms: 10, trial_secs: 1 };
        let counts = run_trial(method, packets, &cpus[..n], &cfg).expect("trial should run");
        assert_eq!(counts.len(), n);
        assert!(counts.iter().all(|&c| c > 0));
    }
}

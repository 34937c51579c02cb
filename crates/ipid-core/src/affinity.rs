//! CPU enumeration and thread pinning.
//!
//! The benchmark's numbers are only meaningful if every worker actually runs
//! on the CPU it was assigned, so a failed affinity call is always fatal —
//! never silently downgraded to "ran unpinned".

use anyhow::{Context, Result};

/// Enumerate the CPUs this process is currently schedulable on.
///
/// On Linux this reads the calling thread's affinity mask via
/// `sched_getaffinity`, so it reflects cgroup/taskset restrictions rather
/// than the raw core count. Other platforms have no portable equivalent, so
/// this falls back to `0..num_cpus::get()` and the caller is warned.
pub fn available_cpus() -> Result<Vec<usize>> {
    #[cfg(target_os = "linux")]
    {
        unsafe {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            let ret = libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut set);
            if ret != 0 {
                return Err(std::io::Error::last_os_error())
                    .context("sched_getaffinity failed while enumerating schedulable CPUs");
            }
            let max = num_cpus::get().max(libc::CPU_SETSIZE as usize);
            let cpus: Vec<usize> = (0..max).filter(|&c| libc::CPU_ISSET(c, &set)).collect();
            if cpus.is_empty() {
                anyhow::bail!("sched_getaffinity returned an empty CPU set");
            }
            Ok(cpus)
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        tracing::warn!(
            "CPU affinity enumeration is not supported on this platform; \
             falling back to 0..{} with no guarantee these are distinct physical cores",
            num_cpus::get()
        );
        Ok((0..num_cpus::get()).collect())
    }
}

/// Pin the calling thread to `cpu`. Fails loudly rather than degrading to an
/// unpinned thread, since that would invalidate the measurement.
pub fn pin_current_thread(cpu: usize) -> Result<()> {
    #[cfg(target_os = "linux")]
    {
        unsafe {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            libc::CPU_SET(cpu, &mut set);
            let ret = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set);
            if ret != 0 {
                return Err(std::io::Error::last_os_error())
                    .with_context(|| format!("sched_setaffinity failed for cpu {cpu}"));
            }
        }
        Ok(())
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = cpu;
        anyhow::bail!(
            "CPU affinity pinning is not supported on this platform; \
             refusing to run an unpinned trial"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_cpus_is_nonempty() {
        let cpus = available_cpus().expect("CPU enumeration should succeed in CI");
        assert!(!cpus.is_empty());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn pin_to_first_available_cpu_succeeds() {
        let cpus = available_cpus().unwrap();
        pin_current_thread(cpus[0]).expect("pinning to a schedulable CPU must succeed");
    }
}

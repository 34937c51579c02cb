//! Monotonic millisecond clock.
//!
//! Uses `CLOCK_MONOTONIC` directly on Linux so the per-bucket and
//! per-destination methods measure real elapsed time without paying for an
//! `Instant`-to-`Duration` conversion on every `assign`. Other platforms fall
//! back to a process-wide `Instant` epoch, mirroring how the teacher's
//! `metrics::now_ns` is split the same way.

#[inline(always)]
pub fn now_ms() -> u64 {
    #[cfg(target_os = "linux")]
    {
        let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
        unsafe {
            libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
        }
        (ts.tv_sec as u64) * 1_000 + (ts.tv_nsec as u64) / 1_000_000
    }
    #[cfg(not(target_os = "linux"))]
    {
        use std::sync::OnceLock;
        use std::time::Instant;
        static EPOCH: OnceLock<Instant> = OnceLock::new();
        let epoch = EPOCH.get_or_init(Instant::now);
        epoch.elapsed().as_millis() as u64
    }
}

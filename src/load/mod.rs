//! CPU load sampling from cumulative OS tick counters.
//!
//! The percentage is derived from counters accumulated since boot, not from the
//! delta between two readings, so it drifts toward the long-run average the
//! longer the machine has been up.

pub mod worker;

use thiserror::Error;

pub use worker::SamplerWorker;

/// Why a sample produced no percentage this cycle.
#[derive(Error, Debug)]
pub enum SampleUnavailable {
    #[error("Failed to read CPU tick counters: {0}")]
    Read(#[from] std::io::Error),

    #[error("Malformed CPU tick counters: {0}")]
    Malformed(String),

    #[error("CPU tick counters sum to zero")]
    ZeroTotal,

    #[cfg(not(any(windows, target_os = "linux")))]
    #[error("CPU tick counters are not available on this platform")]
    Unsupported,
}

/// One reading of the cumulative per-class CPU counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub user: u64,
    pub system: u64,
    pub idle: u64,
    pub nice: u64,
}

impl CpuTicks {
    /// Share of non-idle ticks, in percent. Not clamped: whatever ratio the
    /// counters give is what gets reported.
    pub fn busy_percent(&self) -> Result<f32, SampleUnavailable> {
        let user = self.user as f64;
        let system = self.system as f64;
        let idle = self.idle as f64;
        let nice = self.nice as f64;

        let total = user + system + idle + nice;
        if total == 0.0 {
            return Err(SampleUnavailable::ZeroTotal);
        }
        Ok(((user + system + nice) / total * 100.0) as f32)
    }
}

/// Something that can read the OS counters.
pub trait TickSource {
    fn read_ticks(&self) -> Result<CpuTicks, SampleUnavailable>;
}

/// Stateless sampler: one OS read per call, no retries, no history.
pub struct LoadSampler<S> {
    source: S,
}

impl<S: TickSource> LoadSampler<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn sample(&self) -> Result<f32, SampleUnavailable> {
        self.source.read_ticks()?.busy_percent()
    }
}

impl LoadSampler<crate::platform::SystemTicks> {
    /// Sampler backed by this platform's counters.
    pub fn system() -> Self {
        Self::new(crate::platform::SystemTicks::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Frozen(CpuTicks);

    impl TickSource for Frozen {
        fn read_ticks(&self) -> Result<CpuTicks, SampleUnavailable> {
            Ok(self.0)
        }
    }

    struct Broken;

    impl TickSource for Broken {
        fn read_ticks(&self) -> Result<CpuTicks, SampleUnavailable> {
            Err(SampleUnavailable::Read(std::io::Error::other("host_statistics failed")))
        }
    }

    fn ticks(user: u64, system: u64, idle: u64, nice: u64) -> CpuTicks {
        CpuTicks {
            user,
            system,
            idle,
            nice,
        }
    }

    #[test]
    fn busy_share_of_total() {
        let sampler = LoadSampler::new(Frozen(ticks(50, 20, 20, 10)));
        let pct = sampler.sample().unwrap();
        assert!((pct - 80.0).abs() < 1e-4, "got {pct}");
    }

    #[test]
    fn zero_total_is_unavailable() {
        let sampler = LoadSampler::new(Frozen(CpuTicks::default()));
        assert!(matches!(sampler.sample(), Err(SampleUnavailable::ZeroTotal)));
    }

    #[test]
    fn read_failure_is_unavailable() {
        let sampler = LoadSampler::new(Broken);
        assert!(matches!(sampler.sample(), Err(SampleUnavailable::Read(_))));
    }

    #[test]
    fn idle_machine_is_zero_and_busy_machine_is_hundred() {
        assert_eq!(ticks(0, 0, 500, 0).busy_percent().unwrap(), 0.0);
        assert_eq!(ticks(1, 2, 0, 3).busy_percent().unwrap(), 100.0);
    }

    #[test]
    fn always_within_percent_range() {
        for user in [0u64, 1, 7, 1_000, 9_999_999] {
            for system in [0u64, 3, 250_000] {
                for idle in [0u64, 1, 42, 80_000_000] {
                    for nice in [0u64, 5, 12_345] {
                        let t = ticks(user, system, idle, nice);
                        match t.busy_percent() {
                            Ok(p) => assert!((0.0..=100.0).contains(&p), "{t:?} -> {p}"),
                            Err(_) => assert_eq!(user + system + idle + nice, 0),
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn frozen_counters_repeat_exactly() {
        let sampler = LoadSampler::new(Frozen(ticks(123, 456, 789, 10)));
        let first = sampler.sample().unwrap();
        for _ in 0..10 {
            assert_eq!(sampler.sample().unwrap(), first);
        }
    }
}

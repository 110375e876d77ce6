#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub mod procfs;
#[cfg(windows)]
pub mod win32;

#[cfg(target_os = "linux")]
pub use procfs::ProcStat as SystemTicks;
#[cfg(windows)]
pub use win32::SystemTimes as SystemTicks;

#[cfg(not(any(windows, target_os = "linux")))]
pub use fallback::NoTicks as SystemTicks;

#[cfg(not(any(windows, target_os = "linux")))]
mod fallback {
    use crate::load::{CpuTicks, SampleUnavailable, TickSource};

    /// No counter source on this platform; every sample is unavailable.
    #[derive(Debug, Default)]
    pub struct NoTicks;

    impl TickSource for NoTicks {
        fn read_ticks(&self) -> Result<CpuTicks, SampleUnavailable> {
            Err(SampleUnavailable::Unsupported)
        }
    }
}

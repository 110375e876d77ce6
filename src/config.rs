//! Startup configuration.
//!
//! Everything has a built-in default; a few environment variables may
//! override them for the lifetime of the process. Nothing is written back.

use std::path::PathBuf;
use std::time::Duration;

/// Frame advance interval.
pub const DEFAULT_FRAME_MS: u64 = 200;
/// CPU sampling interval.
pub const DEFAULT_SAMPLE_MS: u64 = 3000;
/// How late a sampling wakeup may be coalesced.
pub const SAMPLE_TOLERANCE_MS: u64 = 200;

const FRAME_MS_RANGE: (u64, u64) = (20, 2000);
const SAMPLE_MS_RANGE: (u64, u64) = (500, 60_000);

pub const ENV_FRAME_MS: &str = "RUN_NEKO_FRAME_MS";
pub const ENV_SAMPLE_MS: &str = "RUN_NEKO_SAMPLE_MS";
pub const ENV_ASSETS: &str = "RUN_NEKO_ASSETS";

#[derive(Debug, Clone)]
pub struct Config {
    pub frame_interval: Duration,
    pub sample_interval: Duration,
    pub sample_tolerance: Duration,
    /// Directory holding `<theme>_<runner>_<n>.ico` frames.
    pub asset_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(DEFAULT_FRAME_MS),
            sample_interval: Duration::from_millis(DEFAULT_SAMPLE_MS),
            sample_tolerance: Duration::from_millis(SAMPLE_TOLERANCE_MS),
            asset_dir: default_asset_dir(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Bad values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(ms) = parse_ms(&lookup, ENV_FRAME_MS, FRAME_MS_RANGE) {
            cfg.frame_interval = Duration::from_millis(ms);
        }

        if let Some(ms) = parse_ms(&lookup, ENV_SAMPLE_MS, SAMPLE_MS_RANGE) {
            cfg.sample_interval = Duration::from_millis(ms);
        }

        if let Some(dir) = lookup(ENV_ASSETS) {
            if !dir.trim().is_empty() {
                cfg.asset_dir = PathBuf::from(dir.trim());
            }
        }

        cfg
    }
}

/// Read a millisecond value and clamp it into `(min, max)`.
fn parse_ms<F>(lookup: &F, key: &str, (min, max): (u64, u64)) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key)?;
    match value.trim().parse::<u64>() {
        Ok(v) => Some(v.max(min).min(max)),
        Err(_) => {
            log::warn!("Ignoring {key}={value:?} (not a number of milliseconds)");
            None
        }
    }
}

/// `assets/` beside the executable, or relative to the working directory.
fn default_asset_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("assets")))
        .unwrap_or_else(|| PathBuf::from("assets"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let cfg = Config::from_lookup(lookup(&[]));
        assert_eq!(cfg.frame_interval, Duration::from_millis(200));
        assert_eq!(cfg.sample_interval, Duration::from_millis(3000));
        assert_eq!(cfg.sample_tolerance, Duration::from_millis(200));
        assert!(cfg.asset_dir.ends_with("assets"));
    }

    #[test]
    fn overrides_asset_dir() {
        let cfg = Config::from_lookup(lookup(&[(ENV_ASSETS, "/opt/neko/icons")]));
        assert_eq!(cfg.asset_dir, PathBuf::from("/opt/neko/icons"));
    }

    #[test]
    fn startup_selection_is_not_configurable() {
        // Runner and theme always start at the built-in pair; these keys are
        // not read.
        let cfg = Config::from_lookup(lookup(&[
            ("RUN_NEKO_RUNNER", "horse"),
            ("RUN_NEKO_THEME", "dark"),
        ]));
        let defaults = Config::default();
        assert_eq!(cfg.frame_interval, defaults.frame_interval);
        assert_eq!(cfg.sample_interval, defaults.sample_interval);
        assert_eq!(cfg.asset_dir, defaults.asset_dir);
    }

    #[test]
    fn clamps_intervals() {
        let cfg = Config::from_lookup(lookup(&[(ENV_FRAME_MS, "1"), (ENV_SAMPLE_MS, "999999")]));
        assert_eq!(cfg.frame_interval, Duration::from_millis(20));
        assert_eq!(cfg.sample_interval, Duration::from_millis(60_000));

        let cfg = Config::from_lookup(lookup(&[(ENV_FRAME_MS, " 120 ")]));
        assert_eq!(cfg.frame_interval, Duration::from_millis(120));
    }

    #[test]
    fn invalid_values_fall_back() {
        let cfg = Config::from_lookup(lookup(&[
            (ENV_FRAME_MS, "fast"),
            (ENV_SAMPLE_MS, "-5"),
            (ENV_ASSETS, "  "),
        ]));
        let defaults = Config::default();
        assert_eq!(cfg.frame_interval, defaults.frame_interval);
        assert_eq!(cfg.sample_interval, defaults.sample_interval);
        assert_eq!(cfg.asset_dir, defaults.asset_dir);
    }
}

use std::path::PathBuf;

use crate::load::{CpuTicks, SampleUnavailable, TickSource};

const PROC_STAT: &str = "/proc/stat";

/// Aggregate CPU counters from `/proc/stat`.
#[derive(Debug)]
pub struct ProcStat {
    path: PathBuf,
}

impl Default for ProcStat {
    fn default() -> Self {
        Self {
            path: PathBuf::from(PROC_STAT),
        }
    }
}

impl TickSource for ProcStat {
    fn read_ticks(&self) -> Result<CpuTicks, SampleUnavailable> {
        let text = std::fs::read_to_string(&self.path)?;
        parse_proc_stat(&text)
    }
}

/// Parse the aggregate `cpu` line: `cpu  user nice system idle iowait ...`.
/// Only the first four columns are used.
pub fn parse_proc_stat(text: &str) -> Result<CpuTicks, SampleUnavailable> {
    let line = text
        .lines()
        .find(|l| l.split_whitespace().next() == Some("cpu"))
        .ok_or_else(|| SampleUnavailable::Malformed("no aggregate cpu line".into()))?;

    let mut fields = line.split_whitespace().skip(1).map(|f| {
        f.parse::<u64>()
            .map_err(|_| SampleUnavailable::Malformed(format!("bad counter {f:?}")))
    });
    let mut next = || {
        fields
            .next()
            .unwrap_or_else(|| Err(SampleUnavailable::Malformed("too few counters".into())))
    };

    let user = next()?;
    let nice = next()?;
    let system = next()?;
    let idle = next()?;

    Ok(CpuTicks {
        user,
        system,
        idle,
        nice,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
cpu  74608 2520 24433 1117073 6176 4054 0 0 0 0
cpu0 37784 2065 10917 556265 3007 2064 0 0 0 0
cpu1 36824 455 13516 560808 3169 1990 0 0 0 0
intr 2339547 40 9 0 0 0 0 0 0 1 0
ctxt 4556398
btime 1700000000
";

    #[test]
    fn reads_aggregate_line() {
        let ticks = parse_proc_stat(SAMPLE).unwrap();
        assert_eq!(
            ticks,
            CpuTicks {
                user: 74608,
                system: 24433,
                idle: 1117073,
                nice: 2520,
            }
        );
    }

    #[test]
    fn ignores_per_core_lines() {
        let only_cores = SAMPLE
            .lines()
            .filter(|l| !l.starts_with("cpu "))
            .collect::<Vec<_>>()
            .join("\n");
        assert!(matches!(
            parse_proc_stat(&only_cores),
            Err(SampleUnavailable::Malformed(_))
        ));
    }

    #[test]
    fn rejects_short_or_garbled_lines() {
        assert!(matches!(
            parse_proc_stat("cpu 1 2 3\n"),
            Err(SampleUnavailable::Malformed(_))
        ));
        assert!(matches!(
            parse_proc_stat("cpu 1 two 3 4\n"),
            Err(SampleUnavailable::Malformed(_))
        ));
        assert!(matches!(parse_proc_stat(""), Err(SampleUnavailable::Malformed(_))));
    }

    #[test]
    fn missing_file_is_read_error() {
        let src = ProcStat {
            path: PathBuf::from("/definitely/not/here/stat"),
        };
        assert!(matches!(src.read_ticks(), Err(SampleUnavailable::Read(_))));
    }
}

//! Open file descriptor budget.
//!
//! Every reader thread holds one file open and the walker holds up to one
//! handle per directory level it is iterating. Before a scan starts the soft
//! descriptor limit is raised to cover that, and when the hard limit is too
//! low the worker counts are scaled down to fit instead.

use log::{debug, warn};

use crate::options::ScanConfig;

/// Descriptors every process needs just to exist.
pub const FD_MARGIN: u64 = 16;

/// Reader and walker thread counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerCounts {
    pub readers: usize,
    pub walkers: usize,
}

impl WorkerCounts {
    /// Descriptors these workers may hold at once, plus the margin.
    pub fn high_water_mark(&self) -> u64 {
        (self.readers + self.walkers) as u64 + FD_MARGIN
    }
}

/// Split a descriptor budget one fifth to walkers, four fifths to readers.
pub fn scale_workers_to_limit(max: u64) -> WorkerCounts {
    let base = (max.saturating_sub(FD_MARGIN) / 5).max(1) as usize;
    WorkerCounts {
        readers: base * 4,
        walkers: base,
    }
}

/// What to do about a soft/hard limit pair.
#[cfg_attr(not(unix), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Plan {
    /// New soft limit to request, if any
    raise_to: Option<u64>,
    counts: WorkerCounts,
    /// Counts to fall back to if raising fails
    fallback: WorkerCounts,
}

#[cfg_attr(not(unix), allow(dead_code))]
fn plan(counts: WorkerCounts, soft: u64, hard: u64) -> Plan {
    let high_water_mark = counts.high_water_mark();
    if soft >= high_water_mark {
        return Plan {
            raise_to: None,
            counts,
            fallback: counts,
        };
    }

    let (target, counts) = if hard < high_water_mark {
        warn!("scaling down workers to fit open file limit of {hard}, performance may be sub-optimal");
        (hard, scale_workers_to_limit(hard))
    } else {
        (high_water_mark, counts)
    };

    if soft < hard {
        Plan {
            raise_to: Some(target),
            counts,
            fallback: scale_workers_to_limit(soft),
        }
    } else {
        Plan {
            raise_to: None,
            counts,
            fallback: counts,
        }
    }
}

#[cfg(unix)]
fn get_limit() -> std::io::Result<(u64, u64)> {
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: `limit` is a valid, writable rlimit for the duration of the call.
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut limit) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok((limit.rlim_cur as u64, limit.rlim_max as u64))
}

#[cfg(unix)]
fn set_soft_limit(soft: u64, hard: u64) -> std::io::Result<()> {
    let limit = libc::rlimit {
        rlim_cur: soft as libc::rlim_t,
        rlim_max: hard as libc::rlim_t,
    };
    // SAFETY: `limit` is a valid rlimit and outlives the call.
    if unsafe { libc::setrlimit(libc::RLIMIT_NOFILE, &limit) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Make sure `counts` workers can run under the process descriptor limit,
/// raising the soft limit where possible. Returns the counts to use.
#[cfg(unix)]
pub fn configure_limits(counts: WorkerCounts) -> WorkerCounts {
    let (soft, hard) = match get_limit() {
        Ok(limit) => limit,
        Err(e) => {
            warn!("unable to determine open file limit: {e}");
            return counts;
        }
    };
    debug!("open file limit: current={soft} max={hard}");

    let plan = plan(counts, soft, hard);
    let Some(target) = plan.raise_to else {
        return plan.counts;
    };

    match set_soft_limit(target, hard) {
        Ok(()) => {
            debug!("adjusted open file limit to {target}");
            plan.counts
        }
        Err(e) => {
            warn!("adjusting open file limit failed: {e}");
            plan.fallback
        }
    }
}

#[cfg(not(unix))]
pub fn configure_limits(counts: WorkerCounts) -> WorkerCounts {
    counts
}

/// Fit a config's reader and walker counts to the descriptor limit, for
/// `parallel_scans` scans running at the same time.
pub fn fit_config(mut config: ScanConfig, parallel_scans: usize) -> ScanConfig {
    let scans = parallel_scans.max(1);
    let wanted = WorkerCounts {
        readers: config.reader_workers * scans,
        walkers: config.walker_workers * scans,
    };

    let granted = configure_limits(wanted);
    if granted != wanted {
        config.reader_workers = (granted.readers / scans).max(1);
        config.walker_workers = (granted.walkers / scans).max(1);
        debug!(
            "scaled workers to {} readers and {} walkers per scan",
            config.reader_workers, config.walker_workers
        );
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(readers: usize, walkers: usize) -> WorkerCounts {
        WorkerCounts { readers, walkers }
    }

    #[test]
    fn test_high_water_mark() {
        assert_eq!(counts(32, 8).high_water_mark(), 56);
    }

    #[test]
    fn test_scale_workers() {
        assert_eq!(scale_workers_to_limit(116), counts(80, 20));
        assert_eq!(scale_workers_to_limit(10), counts(4, 1));
    }

    #[test]
    fn enough_descriptors() {
        let p = plan(counts(32, 8), 1024, 4096);
        assert_eq!(p.raise_to, None);
        assert_eq!(p.counts, counts(32, 8));
    }

    #[test]
    fn raise_soft_limit() {
        let p = plan(counts(32, 8), 20, 4096);
        assert_eq!(p.raise_to, Some(56));
        assert_eq!(p.counts, counts(32, 8));
        assert_eq!(p.fallback, scale_workers_to_limit(20));
    }

    #[test]
    fn hard_limit_too_low() {
        let p = plan(counts(320, 80), 64, 256);
        assert_eq!(p.raise_to, Some(256));
        assert_eq!(p.counts, counts(192, 48));
    }

    #[test]
    fn cannot_raise_at_all() {
        let p = plan(counts(320, 80), 256, 256);
        assert_eq!(p.raise_to, None);
        assert_eq!(p.counts, counts(192, 48));
    }

    #[test]
    fn fit_config_keeps_at_least_one_worker() {
        let config = ScanConfig::new().reader_workers(2).walker_workers(1);
        let fitted = fit_config(config, 4);
        assert!(fitted.reader_workers >= 1);
        assert!(fitted.walker_workers >= 1);
    }
}

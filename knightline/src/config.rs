//! Configuration for the knightline runtime.
//!
//! Every tunable has a compile-time default and can be overridden through a
//! dedicated environment variable. Command-line flags take precedence over
//! both; that merging happens in `main`.

use std::path::PathBuf;
use std::time::Duration;

use engine::transport::process::ENGINE_PATH_ENV;

/// Skill level used when nothing else is configured.
const DEFAULT_SKILL_LEVEL: i32 = 1;

/// Default time the engine gets to answer one search (in seconds).
const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 30;

/// Get an explicitly configured engine binary.
///
/// Priority:
/// 1. `KNIGHTLINE_ENGINE_PATH` env variable if set
/// 2. `None`, leaving discovery of a `stockfish` binary to the transport
pub fn get_engine_path() -> Option<PathBuf> {
    std::env::var_os(ENGINE_PATH_ENV).map(PathBuf::from)
}

/// Get the engine skill level.
///
/// Priority:
/// 1. `KNIGHTLINE_SKILL_LEVEL` env variable if set (falls back to the default
///    if the value is not an integer; out-of-range values are clamped later)
/// 2. `1` as fallback
pub fn get_skill_level() -> i32 {
    if let Ok(level) = std::env::var("KNIGHTLINE_SKILL_LEVEL") {
        return level.trim().parse().unwrap_or(DEFAULT_SKILL_LEVEL);
    }

    DEFAULT_SKILL_LEVEL
}

/// Get the analysis deadline in seconds. `0` means no deadline.
///
/// Priority:
/// 1. `KNIGHTLINE_ANALYSIS_TIMEOUT_SECS` env variable if set (falls back to
///    the default if the value cannot be parsed as a `u64`)
/// 2. `30` seconds as fallback
pub fn get_analysis_timeout_secs() -> u64 {
    if let Ok(timeout) = std::env::var("KNIGHTLINE_ANALYSIS_TIMEOUT_SECS") {
        return timeout.trim().parse().unwrap_or(DEFAULT_ANALYSIS_TIMEOUT_SECS);
    }

    DEFAULT_ANALYSIS_TIMEOUT_SECS
}

/// Convert a timeout in seconds into a session deadline.
pub fn analysis_timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Get the directory for rolling log files.
///
/// `None` when `KNIGHTLINE_LOG_DIR` is unset, in which case logs go to stderr.
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var_os("KNIGHTLINE_LOG_DIR").map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_engine_path() {
        let path = get_engine_path();
        match std::env::var(ENGINE_PATH_ENV) {
            Ok(val) => assert_eq!(path, Some(PathBuf::from(val))),
            Err(_) => assert_eq!(path, None),
        }
    }

    #[test]
    fn test_get_skill_level_default() {
        if std::env::var("KNIGHTLINE_SKILL_LEVEL").is_err() {
            assert_eq!(get_skill_level(), DEFAULT_SKILL_LEVEL);
        }
    }

    #[test]
    fn test_get_analysis_timeout_secs_default() {
        if std::env::var("KNIGHTLINE_ANALYSIS_TIMEOUT_SECS").is_err() {
            assert_eq!(get_analysis_timeout_secs(), DEFAULT_ANALYSIS_TIMEOUT_SECS);
        }
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        assert_eq!(analysis_timeout(0), None);
        assert_eq!(analysis_timeout(5), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_get_log_dir() {
        let dir = get_log_dir();
        match std::env::var("KNIGHTLINE_LOG_DIR") {
            Ok(val) => assert_eq!(dir, Some(PathBuf::from(val))),
            Err(_) => assert_eq!(dir, None),
        }
    }
}

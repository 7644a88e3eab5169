use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

/// Longest sample quote accepted, one leap year.
pub const MAX_QUOTE_HOURS: f64 = 366.0 * 24.0;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// JSON `ConfigSnapshot` to validate. `None` uses the built-in tariff.
    pub snapshot_path: Option<PathBuf>,
    /// Stay length for the sample quote per vehicle type (default: `24`).
    pub quote_hours: f64,
    /// Apply every auto-fixable issue and re-validate (default: `false`).
    pub apply_auto_fixes: bool,
    /// Debounce window for the validation scheduler (default: `250` ms).
    pub debounce: Duration,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default            |
    /// |--------------------------|--------------------|
    /// | `SNAPSHOT_PATH`          | built-in tariff    |
    /// | `QUOTE_HOURS`            | `24`               |
    /// | `APPLY_AUTO_FIXES`       | `false`            |
    /// | `VALIDATION_DEBOUNCE_MS` | `250`              |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let snapshot_path = lookup("SNAPSHOT_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let quote_hours: f64 = lookup("QUOTE_HOURS")
            .unwrap_or_else(|| "24".into())
            .parse()
            .context("QUOTE_HOURS must be a number")?;
        if !(quote_hours > 0.0 && quote_hours <= MAX_QUOTE_HOURS) {
            anyhow::bail!(
                "QUOTE_HOURS must be greater than zero and at most {MAX_QUOTE_HOURS}, got {quote_hours}"
            );
        }

        let apply_auto_fixes: bool = lookup("APPLY_AUTO_FIXES")
            .unwrap_or_else(|| "false".into())
            .parse()
            .context("APPLY_AUTO_FIXES must be true or false")?;

        let debounce_ms: u64 = lookup("VALIDATION_DEBOUNCE_MS")
            .unwrap_or_else(|| "250".into())
            .parse()
            .context("VALIDATION_DEBOUNCE_MS must be a valid u64")?;

        Ok(Self {
            snapshot_path,
            quote_hours,
            apply_auto_fixes,
            debounce: Duration::from_millis(debounce_ms),
        })
    }
}

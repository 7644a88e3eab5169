//! Debounced re-validation of published configuration snapshots.
//!
//! [`ValidationScheduler`] runs as a background task. Each burst of snapshot
//! publications produces one validation pass over the newest snapshot once
//! the burst has been quiet for the debounce window. Pending work for an
//! older snapshot is superseded, never queued.

use std::sync::Arc;
use std::time::Duration;

use parkrate_core::store::ConfigSnapshot;
use parkrate_core::validation::{validate_snapshot_report, ValidationReport};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Quiet period required before a changed snapshot is validated.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// A report tagged with the pass that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledReport {
    /// Monotonic pass counter, starting at 1.
    pub pass: u64,
    pub report: ValidationReport,
}

// ---------------------------------------------------------------------------
// ValidationScheduler
// ---------------------------------------------------------------------------

pub struct ValidationScheduler {
    debounce: Duration,
    reports: watch::Sender<Option<Arc<ScheduledReport>>>,
}

impl ValidationScheduler {
    pub fn new(debounce: Duration) -> Self {
        let (reports, _) = watch::channel(None);
        Self { debounce, reports }
    }

    /// Watch published reports. `None` until the first pass completes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<ScheduledReport>>> {
        self.reports.subscribe()
    }

    pub fn latest(&self) -> Option<Arc<ScheduledReport>> {
        self.reports.borrow().clone()
    }

    /// Run the scheduler loop.
    ///
    /// Validates the current snapshot immediately, then once per debounced
    /// burst of changes. Exits when `cancel` fires or the snapshot sender is
    /// dropped.
    pub async fn run(
        &self,
        mut snapshots: watch::Receiver<Arc<ConfigSnapshot>>,
        cancel: CancellationToken,
    ) {
        tracing::info!(debounce_ms = self.debounce.as_millis() as u64, "Validation scheduler started");
        let mut pass = 0;

        let initial = snapshots.borrow_and_update().clone();
        pass += 1;
        self.validate(pass, &initial);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Validation scheduler cancelled");
                    break;
                }
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        tracing::info!("Snapshot channel closed, stopping validation scheduler");
                        break;
                    }
                    if !self.settle(&mut snapshots, &cancel).await {
                        tracing::info!("Validation scheduler cancelled");
                        break;
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    pass += 1;
                    self.validate(pass, &snapshot);
                }
            }
        }
    }

    /// Wait until no new snapshot has arrived for the debounce window.
    ///
    /// Returns `false` if cancelled while waiting. A closed channel ends
    /// the wait so the final snapshot still gets validated.
    async fn settle(
        &self,
        snapshots: &mut watch::Receiver<Arc<ConfigSnapshot>>,
        cancel: &CancellationToken,
    ) -> bool {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(self.debounce) => return true,
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        return true;
                    }
                    tracing::trace!("Snapshot superseded during debounce");
                }
            }
        }
    }

    fn validate(&self, pass: u64, snapshot: &ConfigSnapshot) {
        let report = validate_snapshot_report(snapshot);
        if report.has_blocking_errors() {
            tracing::warn!(
                pass,
                version = report.snapshot_version,
                errors = report.error_count,
                warnings = report.warning_count,
                "Configuration has blocking errors"
            );
        } else {
            tracing::info!(
                pass,
                version = report.snapshot_version,
                warnings = report.warning_count,
                infos = report.info_count,
                "Configuration validated"
            );
        }
        self.reports
            .send_replace(Some(Arc::new(ScheduledReport { pass, report })));
    }
}

impl Default for ValidationScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Validates a parking rate configuration and logs sample quotes.
//!
//! Loads a snapshot (or the built-in tariff), runs it through the
//! validation scheduler, optionally applies auto-fixes, and exits non-zero
//! when blocking errors remain.

mod config;

use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use parkrate_core::fee::estimate_fee;
use parkrate_core::validation::{AutoFixAction, ValidationReport, ValidationSeverity};
use parkrate_core::{calculate_fee, ConfigSnapshot, RateConfigStore};
use parkrate_events::{ConfigBus, ScheduledReport, ValidationScheduler};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parkrate_worker=info,parkrate_events=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env()?;
    let bus = ConfigBus::new(load_store(&config)?);

    let scheduler = Arc::new(ValidationScheduler::new(config.debounce));
    let mut reports = scheduler.subscribe();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        let snapshots = bus.watch();
        let cancel = cancel.clone();
        async move { scheduler.run(snapshots, cancel).await }
    });

    let mut report = next_report(&mut reports).await?;
    log_report(&report.report);

    if config.apply_auto_fixes && apply_fixes(&bus, &report.report) > 0 {
        report = next_report(&mut reports).await?;
        log_report(&report.report);
    }

    log_quotes(&bus.current(), config.quote_hours);

    cancel.cancel();
    handle.await.context("validation scheduler panicked")?;

    if report.report.has_blocking_errors() {
        anyhow::bail!(
            "configuration has {} blocking error(s)",
            report.report.error_count
        );
    }
    tracing::info!("Configuration is valid");
    Ok(())
}

fn load_store(config: &WorkerConfig) -> anyhow::Result<RateConfigStore> {
    let Some(path) = &config.snapshot_path else {
        tracing::info!("No SNAPSHOT_PATH set, using the built-in tariff");
        return Ok(RateConfigStore::with_default_rates());
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snapshot: ConfigSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse snapshot {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        version = snapshot.version(),
        rates = snapshot.rates().len(),
        "Loaded configuration snapshot"
    );
    Ok(RateConfigStore::from_snapshot(snapshot))
}

async fn next_report(
    reports: &mut watch::Receiver<Option<Arc<ScheduledReport>>>,
) -> anyhow::Result<Arc<ScheduledReport>> {
    reports
        .changed()
        .await
        .context("validation scheduler stopped before reporting")?;
    reports
        .borrow_and_update()
        .clone()
        .context("validation scheduler published an empty report")
}

fn log_report(report: &ValidationReport) {
    for issue in &report.issues {
        match issue.severity {
            ValidationSeverity::Error => tracing::error!(
                id = %issue.id,
                key = %issue.setting_key,
                fixable = issue.auto_fixable,
                "{}",
                issue.message
            ),
            ValidationSeverity::Warning => tracing::warn!(
                id = %issue.id,
                key = %issue.setting_key,
                fixable = issue.auto_fixable,
                "{}",
                issue.message
            ),
            ValidationSeverity::Info => {
                tracing::info!(id = %issue.id, key = %issue.setting_key, "{}", issue.message)
            }
        }
    }
    tracing::info!(
        version = report.snapshot_version,
        errors = report.error_count,
        warnings = report.warning_count,
        infos = report.info_count,
        "Validation report"
    );
}

/// Apply each distinct fix in `report`. Returns how many were applied.
fn apply_fixes(bus: &ConfigBus, report: &ValidationReport) -> usize {
    let mut fixes: Vec<&AutoFixAction> = report
        .auto_fixable()
        .filter_map(|i| i.auto_fix_data.as_ref())
        .collect();
    fixes.dedup();

    let mut applied = 0;
    for fix in fixes {
        match bus.update(fix.target_field(), |store| store.apply_auto_fix(fix)) {
            Ok(()) => {
                tracing::info!(
                    target_field = fix.target_field(),
                    value = %fix.replacement_value(),
                    "Applied auto-fix"
                );
                applied += 1;
            }
            Err(e) => tracing::warn!(error = %e, "Skipped auto-fix"),
        }
    }
    applied
}

fn log_quotes(snapshot: &ConfigSnapshot, hours: f64) {
    let entry = Utc::now();
    let Some(exit) = Duration::try_milliseconds((hours * 3_600_000.0).round() as i64)
        .and_then(|stay| entry.checked_add_signed(stay))
    else {
        tracing::warn!(hours, "Sample quote duration out of range, skipping quotes");
        return;
    };

    for rate in snapshot.all().filter(|r| r.is_active) {
        let vehicle_type = rate.vehicle_type.as_str();
        match calculate_fee(snapshot, vehicle_type, entry, exit, None) {
            Ok(fee) => tracing::info!(
                vehicle_type,
                hours,
                days = fee.calculated_days,
                total_fee = fee.total_fee,
                estimate = estimate_fee(snapshot, vehicle_type, hours).ok(),
                overstay = fee.is_overstay,
                "Sample quote"
            ),
            Err(e) => tracing::warn!(vehicle_type, error = %e, "Sample quote failed"),
        }
    }
}

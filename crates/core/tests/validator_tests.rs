//! Integration tests for the configuration validator and auto-fix loop.

use parkrate_core::rate_config::RateConfig;
use parkrate_core::settings::{BusinessSettings, CategorySettings, SecuritySettings};
use parkrate_core::validation::{
    find_auto_fix, validate_snapshot_report, AutoFixAction, ValidationSeverity,
};
use parkrate_core::{validate_complete_system, RateConfigStore};

// ---------------------------------------------------------------------------
// Test: zero base rate
// ---------------------------------------------------------------------------

/// A zero base rate yields a non-fixable error for that vehicle type.
#[test]
fn zero_base_rate_reports_error() {
    let mut store = RateConfigStore::with_default_rates();
    store
        .upsert_rate(RateConfig::new("6 Wheeler", 0.0))
        .expect("structurally valid");

    let issues = validate_complete_system(&store.snapshot());
    let errors: Vec<_> = issues
        .iter()
        .filter(|i| i.severity == ValidationSeverity::Error)
        .collect();

    assert_eq!(errors.len(), 1);
    assert!(errors[0].setting_key.contains("6 Wheeler"));
    assert!(!errors[0].auto_fixable);
}

// ---------------------------------------------------------------------------
// Test: auto-fix round trip
// ---------------------------------------------------------------------------

/// Applying the hierarchy fix by issue id clears the warning.
#[test]
fn hierarchy_fix_resolves_warning() {
    let mut store = RateConfigStore::new();
    store.upsert_rate(RateConfig::new("2 Wheeler", 50.0)).unwrap();
    store.upsert_rate(RateConfig::new("4 Wheeler", 40.0)).unwrap();

    let issues = validate_complete_system(&store.snapshot());
    assert_eq!(issues.len(), 1);
    let fix = find_auto_fix(&issues, &issues[0].id)
        .cloned()
        .expect("hierarchy warning carries a fix");
    assert_eq!(fix.target_field(), "rates.baseRate");

    store.apply_auto_fix(&fix).expect("vehicle types still exist");
    assert!(validate_complete_system(&store.snapshot()).is_empty());
    assert_eq!(store.get("2 Wheeler").unwrap().base_rate, 40.0);
    assert_eq!(store.get("4 Wheeler").unwrap().base_rate, 50.0);
}

/// Every auto-fixable issue in a broken configuration can be applied, and
/// only non-fixable issues remain afterwards.
#[test]
fn applying_all_fixes_leaves_unfixable_issues() {
    let mut store = RateConfigStore::with_default_rates();
    store.upsert_rate(RateConfig::new("Trailer", 0.0)).unwrap();
    store.apply_settings(CategorySettings::Business(BusinessSettings {
        payment_methods: vec![],
        ..Default::default()
    }));
    store.apply_settings(CategorySettings::Security(SecuritySettings {
        session_inactivity_timeout_minutes: 15,
    }));

    let report = validate_snapshot_report(&store.snapshot());
    assert!(report.has_blocking_errors());
    let fixes: Vec<AutoFixAction> = report
        .auto_fixable()
        .filter_map(|i| i.auto_fix_data.clone())
        .collect();
    assert!(fixes.len() >= 2);
    for fix in &fixes {
        store.apply_auto_fix(fix).expect("fix applies");
    }

    let remaining = validate_complete_system(&store.snapshot());
    assert!(remaining.iter().all(|i| !i.auto_fixable), "{remaining:?}");
    // The reorder moves the zero rate to the lowest tier.
    assert!(remaining.iter().any(|i| i.id == "rate.non_positive:2 Wheeler"));
}

/// Stale fixes referencing removed vehicle types fail without mutating.
#[test]
fn stale_hierarchy_fix_is_rejected() {
    let mut store = RateConfigStore::new();
    store.upsert_rate(RateConfig::new("2 Wheeler", 50.0)).unwrap();
    store.upsert_rate(RateConfig::new("4 Wheeler", 40.0)).unwrap();
    let issues = validate_complete_system(&store.snapshot());
    let fix = issues[0].auto_fix_data.clone().expect("fixable");

    store.remove_rate("4 Wheeler").unwrap();
    let version = store.version();
    assert!(store.apply_auto_fix(&fix).is_err());
    assert_eq!(store.version(), version);
    assert_eq!(store.get("2 Wheeler").unwrap().base_rate, 50.0);
}

// ---------------------------------------------------------------------------
// Test: loaded JSON snapshot
// ---------------------------------------------------------------------------

/// A snapshot written by hand with missing categories validates with
/// defaults filled in.
#[test]
fn partial_json_snapshot_validates() {
    let json = serde_json::json!({
        "rates": [
            {
                "vehicleType": "2 Wheeler",
                "baseRate": 60.0,
                "minimumCharge": 0.0,
                "category": "two_wheeler",
                "overstayThresholdHours": 24.0,
                "overstayPenaltyRate": 0.0,
                "isActive": true,
                "createdAt": "2024-01-01T00:00:00Z",
                "updatedAt": "2024-01-01T00:00:00Z"
            },
            {
                "vehicleType": "4 Wheeler",
                "baseRate": 55.0,
                "minimumCharge": 0.0,
                "category": "four_wheeler",
                "overstayThresholdHours": 24.0,
                "overstayPenaltyRate": 0.0,
                "isActive": true,
                "createdAt": "2024-01-01T00:00:00Z",
                "updatedAt": "2024-01-01T00:00:00Z"
            }
        ],
        "settings": { "performance": { "apiTimeoutMs": 1000 } }
    });
    let snapshot = serde_json::from_value(json).expect("snapshot should parse");
    let report = validate_snapshot_report(&snapshot);

    assert_eq!(report.error_count, 0);
    assert_eq!(report.warning_count, 2);
    let ids: Vec<_> = report.issues.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["rate.hierarchy:2 Wheeler>4 Wheeler", "cross.api_timeout_short"]
    );
}

//! End-to-end fee scenarios against a store-built snapshot.
//!
//! Covers the reference quotes for a 4 Wheeler plus the calculation errors
//! a caller can hit.

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use parkrate_core::adjustment::Adjustment;
use parkrate_core::fee::{estimate_fee, rate_schedule};
use parkrate_core::modifier::{AppliesTo, HourRange, Modifier};
use parkrate_core::promotion::Promotion;
use parkrate_core::rate_config::RateConfig;
use parkrate_core::settings::{CategorySettings, TaxPolicy};
use parkrate_core::types::Timestamp;
use parkrate_core::{calculate_fee, validate_fee_calculation, CoreError, RateConfigStore};

fn at(day: u32, hour: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

fn store() -> RateConfigStore {
    let mut store = RateConfigStore::new();
    store
        .upsert_rate(
            RateConfig::new("4 Wheeler", 100.0)
                .with_minimum_charge(50.0)
                .with_overstay(24.0, 10.0),
        )
        .expect("valid rate config");
    store
}

// ---------------------------------------------------------------------------
// Test: reference quotes
// ---------------------------------------------------------------------------

/// A four hour stay bills one day at the base rate.
#[test]
fn four_hour_stay_bills_single_day() {
    let fee = calculate_fee(&store().snapshot(), "4 Wheeler", at(1, 10), at(1, 14), None)
        .expect("calculation should succeed");

    assert_eq!(fee.calculated_days, 1);
    assert_eq!(fee.base_fee, 100.0);
    assert_eq!(fee.total_fee, 100.0);
    assert!(!fee.is_overstay);
}

/// A 48h stay bills two days plus 24 excess hours of penalty.
#[test]
fn two_day_stay_charges_overstay() {
    let fee = calculate_fee(&store().snapshot(), "4 Wheeler", at(1, 10), at(3, 10), None)
        .expect("calculation should succeed");

    assert_eq!(fee.calculated_days, 2);
    assert!(fee.is_overstay);
    assert_eq!(fee.overstay_penalty, 240.0);
    assert_eq!(fee.total_fee, 440.0);
}

/// Exit equal to entry is rejected with no result.
#[test]
fn zero_length_stay_is_invalid_time_range() {
    let err = calculate_fee(&store().snapshot(), "4 Wheeler", at(1, 10), at(1, 10), None)
        .expect_err("zero-length stay must fail");
    assert_matches!(err, CoreError::InvalidTimeRange { entry, exit } if entry == exit);
}

// ---------------------------------------------------------------------------
// Test: full pipeline
// ---------------------------------------------------------------------------

/// Modifiers, a promotion and tax compose, and the result passes its own
/// consistency check.
#[test]
fn every_component_present_and_consistent() {
    let mut store = store();
    store.set_modifiers(vec![
        Modifier::new(
            AppliesTo {
                hour_range: Some(HourRange(8, 12)),
                vehicle_types: Some(vec!["4 Wheeler".into()]),
                ..Default::default()
            },
            Adjustment::percent(10.0),
        )
        .with_id("morning-peak"),
        Modifier::new(AppliesTo::default(), Adjustment::fixed(-5.0)).with_id("loyalty"),
    ]);
    store.set_promotions(vec![Promotion::new(at(1, 0), at(31, 0), Adjustment::fixed(20.0))
        .with_id("new-year")]);
    store.apply_settings(CategorySettings::Tax(TaxPolicy::new(10.0)));

    let fee = calculate_fee(&store.snapshot(), "4 Wheeler", at(1, 10), at(2, 12), None)
        .expect("calculation should succeed");

    // 26h: 2 days, 2 excess hours.
    assert_eq!(fee.calculated_days, 2);
    assert_eq!(fee.base_fee, 200.0);
    assert_eq!(fee.modifier_fees, 15.0);
    assert_eq!(fee.overstay_penalty, 20.0);
    assert_eq!(fee.promotion_discount, 20.0);
    assert!((fee.tax_amount - 21.5).abs() < 1e-9);
    assert!((fee.total_fee - 236.5).abs() < 1e-9);
    assert_eq!(fee.applied_modifier_ids, vec!["morning-peak", "loyalty"]);
    assert_eq!(fee.applied_promotion_id.as_deref(), Some("new-year"));

    let check = validate_fee_calculation(&fee);
    assert!(check.is_valid, "{:?}", check.issues);
}

/// Results serialize with camelCase keys for the settings UI.
#[test]
fn result_serializes_camel_case() {
    let fee = calculate_fee(&store().snapshot(), "4 Wheeler", at(1, 10), at(1, 14), None)
        .expect("calculation should succeed");
    let json = serde_json::to_value(&fee).expect("serialization should succeed");

    assert_eq!(json["totalFee"], 100.0);
    assert_eq!(json["calculatedDays"], 1);
    assert_eq!(json["isOverstay"], false);
    assert_eq!(json["calculationMethod"], "tiered-daily-with-overstay");
    assert!(json.get("appliedPromotionId").is_none());
}

// ---------------------------------------------------------------------------
// Test: snapshot isolation
// ---------------------------------------------------------------------------

/// A snapshot taken before a rate change keeps quoting the old rate.
#[test]
fn old_snapshot_keeps_old_rate() {
    let mut store = store();
    let before = store.snapshot();
    store
        .upsert_rate(RateConfig::new("4 Wheeler", 120.0))
        .expect("valid rate config");

    let old = calculate_fee(&before, "4 Wheeler", at(1, 10), at(1, 14), None).unwrap();
    let new = calculate_fee(&store.snapshot(), "4 Wheeler", at(1, 10), at(1, 14), None).unwrap();
    assert_eq!(old.applied_rate, 100.0);
    assert_eq!(new.applied_rate, 120.0);
    assert!(new.snapshot_version > old.snapshot_version);
}

// ---------------------------------------------------------------------------
// Test: default tariff helpers
// ---------------------------------------------------------------------------

/// Estimates for the standard tariff follow the started-day rule.
#[test]
fn default_tariff_estimates() {
    let snapshot = RateConfigStore::with_default_rates().snapshot();
    let cases = [
        ("2 Wheeler", 5.0, 50.0),
        ("4 Wheeler", 24.0, 100.0),
        ("6 Wheeler", 36.0, 300.0),
        ("Trailer", 49.0, 675.0),
    ];
    for (vehicle_type, hours, expected) in cases {
        let estimate = estimate_fee(&snapshot, vehicle_type, hours).expect("known vehicle type");
        assert_eq!(estimate, expected, "{vehicle_type} for {hours}h");
    }
}

/// The published schedule describes the day-rounding rule.
#[test]
fn schedule_describes_method() {
    let schedule = rate_schedule(&RateConfigStore::with_default_rates().snapshot());
    assert_eq!(schedule.entries.len(), 4);
    assert!(schedule.method_description.contains("ceiling(hours/24)"));
    assert_eq!(schedule.calculation_method, "tiered-daily-with-overstay");
}

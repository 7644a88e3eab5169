//! Fee calculation for a single stay.
//!
//! Billing is per started day: a stay is charged `ceil(hours / 24)` days
//! (at least one), floored at the vehicle type's minimum charge. Modifiers,
//! the overstay penalty, one promotion and tax are layered on top.

use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::rate_config::RateConfig;
use crate::store::ConfigSnapshot;
use crate::thresholds::validate_finite;
use crate::types::{SnapshotVersion, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const CALCULATION_METHOD: &str = "tiered-daily-with-overstay";

const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_DAY: u64 = 24 * MS_PER_HOUR as u64;

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Itemised fee for one stay.
///
/// `total_fee` always equals the clamped sum of the components:
/// `max(0, base_fee + modifier_fees + overstay_penalty - promotion_discount + tax_amount)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeCalculationResult {
    pub vehicle_type: String,
    pub total_fee: f64,
    pub duration_hours: f64,
    pub calculated_days: u32,
    pub base_fee: f64,
    pub modifier_fees: f64,
    pub overstay_penalty: f64,
    pub promotion_discount: f64,
    pub tax_amount: f64,
    pub is_overstay: bool,
    pub has_promotions: bool,
    pub applied_rate: f64,
    #[serde(default)]
    pub applied_modifier_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_promotion_id: Option<String>,
    pub calculation_method: String,
    pub calculation_timestamp: Timestamp,
    #[serde(default)]
    pub snapshot_version: SnapshotVersion,
}

impl FeeCalculationResult {
    /// Recompute the total from the components.
    pub fn reconstructed_total(&self) -> f64 {
        (self.base_fee + self.modifier_fees + self.overstay_penalty - self.promotion_discount
            + self.tax_amount)
            .max(0.0)
    }
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Calculate the fee for a stay of `vehicle_type` from `entry` to `exit`.
///
/// `location` narrows promotion eligibility; promotions restricted to
/// locations still match when no location is supplied.
pub fn calculate_fee(
    snapshot: &ConfigSnapshot,
    vehicle_type: &str,
    entry: Timestamp,
    exit: Timestamp,
    location: Option<&str>,
) -> Result<FeeCalculationResult, CoreError> {
    if exit <= entry {
        return Err(CoreError::InvalidTimeRange { entry, exit });
    }
    let rate = active_rate(snapshot, vehicle_type)?;

    let duration_ms = (exit - entry).num_milliseconds();
    let duration_hours = duration_ms as f64 / MS_PER_HOUR as f64;
    let calculated_days = days_for_millis(duration_ms);
    let base_fee = base_fee_for(rate, calculated_days);

    let offset = Duration::minutes(i64::from(
        snapshot.settings().business.utc_offset_minutes,
    ));
    let (local_entry, local_exit) = (local(entry, offset), local(exit, offset));

    let mut modifier_fees = 0.0;
    let mut applied_modifier_ids = Vec::new();
    for m in snapshot
        .modifiers()
        .applicable(vehicle_type, local_entry, local_exit)
    {
        modifier_fees += m.adjustment.resolve(base_fee);
        applied_modifier_ids.push(m.id.clone());
    }

    let overstay_penalty = overstay_penalty_for(rate, duration_hours);
    let is_overstay = duration_hours > rate.overstay_threshold_hours;

    let promotion = snapshot.promotions().select(vehicle_type, location, entry);
    let promotion_discount = promotion.map_or(0.0, |p| p.discount_for(base_fee));

    let pre_tax = base_fee + modifier_fees + overstay_penalty - promotion_discount;
    let tax_amount = snapshot.settings().tax.tax_on(pre_tax);
    let total_fee = (pre_tax + tax_amount).max(0.0);

    tracing::debug!(
        vehicle_type,
        duration_hours,
        calculated_days,
        total_fee,
        modifiers = applied_modifier_ids.len(),
        promotion = promotion.map(|p| p.id.as_str()),
        version = snapshot.version(),
        "Calculated parking fee"
    );

    Ok(FeeCalculationResult {
        vehicle_type: vehicle_type.to_string(),
        total_fee,
        duration_hours,
        calculated_days,
        base_fee,
        modifier_fees,
        overstay_penalty,
        promotion_discount,
        tax_amount,
        is_overstay,
        has_promotions: promotion.is_some(),
        applied_rate: rate.base_rate,
        applied_modifier_ids,
        applied_promotion_id: promotion.map(|p| p.id.clone()),
        calculation_method: CALCULATION_METHOD.to_string(),
        calculation_timestamp: Utc::now(),
        snapshot_version: snapshot.version(),
    })
}

/// Base-fee-only quote for a stay of `duration_hours`.
///
/// Ignores modifiers, promotions, overstay and tax.
pub fn estimate_fee(
    snapshot: &ConfigSnapshot,
    vehicle_type: &str,
    duration_hours: f64,
) -> Result<f64, CoreError> {
    validate_finite(duration_hours, "duration_hours")?;
    if duration_hours <= 0.0 {
        return Err(CoreError::Validation(format!(
            "duration_hours must be greater than zero, got {duration_hours}"
        )));
    }
    let rate = active_rate(snapshot, vehicle_type)?;
    Ok(base_fee_for(rate, days_for_hours(duration_hours)))
}

/// Penalty for a stay of `duration_hours` under `rate`'s overstay policy.
///
/// Charged per started excess hour; zero at or below the threshold.
pub fn overstay_penalty_for(rate: &RateConfig, duration_hours: f64) -> f64 {
    let excess = duration_hours - rate.overstay_threshold_hours;
    if excess > 0.0 {
        rate.overstay_penalty_rate * excess.ceil()
    } else {
        0.0
    }
}

fn active_rate<'a>(
    snapshot: &'a ConfigSnapshot,
    vehicle_type: &str,
) -> Result<&'a RateConfig, CoreError> {
    let rate = snapshot.get(vehicle_type)?;
    if !rate.is_active {
        return Err(CoreError::InactiveRateConfig(vehicle_type.to_string()));
    }
    Ok(rate)
}

fn days_for_millis(duration_ms: i64) -> u32 {
    let ms = u64::try_from(duration_ms).unwrap_or(0);
    let days = ms.div_ceil(MS_PER_DAY).max(1);
    u32::try_from(days).unwrap_or(u32::MAX)
}

fn days_for_hours(duration_hours: f64) -> u32 {
    days_for_millis((duration_hours * MS_PER_HOUR as f64).round() as i64)
}

fn base_fee_for(rate: &RateConfig, days: u32) -> f64 {
    (rate.base_rate * f64::from(days)).max(rate.minimum_charge)
}

fn local(at: Timestamp, offset: Duration) -> NaiveDateTime {
    at.naive_utc() + offset
}

// ---------------------------------------------------------------------------
// Rate schedule
// ---------------------------------------------------------------------------

/// One row of the published tariff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub vehicle_type: String,
    pub daily_rate: f64,
    pub minimum_charge: f64,
    pub overstay_threshold_hours: f64,
    pub overstay_penalty_rate: f64,
}

/// Human-readable tariff for active vehicle types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSchedule {
    pub entries: Vec<ScheduleEntry>,
    pub tax_rate_percent: f64,
    pub calculation_method: String,
    pub method_description: String,
}

pub fn rate_schedule(snapshot: &ConfigSnapshot) -> RateSchedule {
    let entries = snapshot
        .all()
        .filter(|r| r.is_active)
        .map(|r| ScheduleEntry {
            vehicle_type: r.vehicle_type.clone(),
            daily_rate: r.base_rate,
            minimum_charge: r.minimum_charge,
            overstay_threshold_hours: r.overstay_threshold_hours,
            overstay_penalty_rate: r.overstay_penalty_rate,
        })
        .collect();

    RateSchedule {
        entries,
        tax_rate_percent: snapshot.settings().tax.rate_percent,
        calculation_method: CALCULATION_METHOD.to_string(),
        method_description: "daily_rate * max(1, ceiling(hours/24)), at least the minimum \
                             charge, plus penalty_rate per started hour beyond the overstay \
                             threshold"
            .to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustment::Adjustment;
    use crate::modifier::{AppliesTo, HourRange, Modifier};
    use crate::promotion::Promotion;
    use crate::settings::{BusinessSettings, CategorySettings, TaxPolicy};
    use crate::store::RateConfigStore;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Weekday};

    fn at(day: u32, hour: u32) -> Timestamp {
        // 2024-01-01 is a Monday.
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn four_wheeler_store() -> RateConfigStore {
        let mut store = RateConfigStore::new();
        store
            .upsert_rate(
                RateConfig::new("4 Wheeler", 100.0)
                    .with_minimum_charge(50.0)
                    .with_overstay(24.0, 10.0),
            )
            .unwrap();
        store
    }

    #[test]
    fn short_stay_bills_one_day() {
        let store = four_wheeler_store();
        let fee = calculate_fee(&store.snapshot(), "4 Wheeler", at(1, 10), at(1, 14), None).unwrap();
        assert_eq!(fee.calculated_days, 1);
        assert!(approx(fee.duration_hours, 4.0));
        assert!(approx(fee.base_fee, 100.0));
        assert!(approx(fee.total_fee, 100.0));
        assert!(!fee.is_overstay);
        assert!(!fee.has_promotions);
        assert_eq!(fee.calculation_method, CALCULATION_METHOD);
        assert_eq!(fee.snapshot_version, store.version());
    }

    #[test]
    fn two_day_stay_with_overstay_penalty() {
        let store = four_wheeler_store();
        let fee = calculate_fee(&store.snapshot(), "4 Wheeler", at(1, 10), at(3, 10), None).unwrap();
        assert_eq!(fee.calculated_days, 2);
        assert!(fee.is_overstay);
        assert!(approx(fee.overstay_penalty, 240.0));
        assert!(approx(fee.base_fee, 200.0));
        assert!(approx(fee.total_fee, 440.0));
    }

    #[test]
    fn exact_day_boundary_does_not_round_up() {
        let store = four_wheeler_store();
        let fee = calculate_fee(&store.snapshot(), "4 Wheeler", at(1, 10), at(2, 10), None).unwrap();
        assert_eq!(fee.calculated_days, 1);
        assert!(!fee.is_overstay);

        let later = at(2, 10) + Duration::milliseconds(1);
        let fee = calculate_fee(&store.snapshot(), "4 Wheeler", at(1, 10), later, None).unwrap();
        assert_eq!(fee.calculated_days, 2);
        assert!(fee.is_overstay);
        assert!(approx(fee.overstay_penalty, 10.0));
    }

    #[test]
    fn minimum_charge_floors_base_fee() {
        let mut store = RateConfigStore::new();
        store
            .upsert_rate(RateConfig::new("Bus", 80.0).with_minimum_charge(300.0))
            .unwrap();
        let fee = calculate_fee(&store.snapshot(), "Bus", at(1, 10), at(1, 11), None).unwrap();
        assert!(approx(fee.base_fee, 300.0));
    }

    #[test]
    fn zero_length_stay_rejected() {
        let store = four_wheeler_store();
        let err = calculate_fee(&store.snapshot(), "4 Wheeler", at(1, 10), at(1, 10), None);
        assert_matches!(err, Err(CoreError::InvalidTimeRange { .. }));
        let err = calculate_fee(&store.snapshot(), "4 Wheeler", at(1, 10), at(1, 9), None);
        assert_matches!(err, Err(CoreError::InvalidTimeRange { .. }));
    }

    #[test]
    fn unknown_and_inactive_vehicle_types_rejected() {
        let mut store = four_wheeler_store();
        store
            .upsert_rate(RateConfig::new("Trailer", 225.0).inactive())
            .unwrap();
        let snapshot = store.snapshot();
        assert_matches!(
            calculate_fee(&snapshot, "Bus", at(1, 10), at(1, 11), None),
            Err(CoreError::UnknownVehicleType(vt)) if vt == "Bus"
        );
        assert_matches!(
            calculate_fee(&snapshot, "Trailer", at(1, 10), at(1, 11), None),
            Err(CoreError::InactiveRateConfig(vt)) if vt == "Trailer"
        );
    }

    #[test]
    fn modifiers_stack_fixed_and_percent() {
        let mut store = four_wheeler_store();
        store.set_modifiers(vec![
            Modifier::new(AppliesTo::default(), Adjustment::fixed(15.0)).with_id("flat"),
            Modifier::new(
                AppliesTo {
                    days_of_week: Some(vec![Weekday::Mon]),
                    ..Default::default()
                },
                Adjustment::percent(20.0),
            )
            .with_id("monday"),
            Modifier::new(
                AppliesTo {
                    days_of_week: Some(vec![Weekday::Sat]),
                    ..Default::default()
                },
                Adjustment::percent(50.0),
            )
            .with_id("weekend"),
        ]);
        let fee = calculate_fee(&store.snapshot(), "4 Wheeler", at(1, 10), at(1, 14), None).unwrap();
        assert!(approx(fee.modifier_fees, 35.0));
        assert_eq!(fee.applied_modifier_ids, vec!["flat", "monday"]);
        assert!(approx(fee.total_fee, 135.0));
    }

    #[test]
    fn modifier_hours_use_facility_local_time() {
        let mut store = four_wheeler_store();
        store.set_modifiers(vec![Modifier::new(
            AppliesTo {
                hour_range: Some(HourRange(22, 6)),
                ..Default::default()
            },
            Adjustment::fixed(30.0),
        )]);
        // 18:00-20:00 UTC is 23:30-01:30 at UTC+05:30.
        let entry = at(1, 18);
        let exit = at(1, 20);
        let fee = calculate_fee(&store.snapshot(), "4 Wheeler", entry, exit, None).unwrap();
        assert!(approx(fee.modifier_fees, 0.0));

        store.apply_settings(CategorySettings::Business(BusinessSettings {
            utc_offset_minutes: 330,
            ..Default::default()
        }));
        let fee = calculate_fee(&store.snapshot(), "4 Wheeler", entry, exit, None).unwrap();
        assert!(approx(fee.modifier_fees, 30.0));
    }

    #[test]
    fn total_clamped_at_zero() {
        let mut store = four_wheeler_store();
        store.set_modifiers(vec![Modifier::new(
            AppliesTo::default(),
            Adjustment::fixed(-500.0),
        )]);
        let fee = calculate_fee(&store.snapshot(), "4 Wheeler", at(1, 10), at(1, 14), None).unwrap();
        assert!(approx(fee.modifier_fees, -500.0));
        assert_eq!(fee.total_fee, 0.0);
        assert_eq!(fee.tax_amount, 0.0);
    }

    #[test]
    fn first_eligible_promotion_applies() {
        let mut store = four_wheeler_store();
        store.set_promotions(vec![
            Promotion::new(at(1, 0), at(10, 0), Adjustment::percent(10.0))
                .with_id("airport")
                .at_locations(["Airport"]),
            Promotion::new(at(1, 0), at(10, 0), Adjustment::fixed(25.0)).with_id("winter"),
        ]);
        let snapshot = store.snapshot();

        let fee = calculate_fee(&snapshot, "4 Wheeler", at(1, 10), at(1, 14), Some("Mall")).unwrap();
        assert_eq!(fee.applied_promotion_id.as_deref(), Some("winter"));
        assert!(approx(fee.promotion_discount, 25.0));
        assert!(approx(fee.total_fee, 75.0));

        let fee = calculate_fee(&snapshot, "4 Wheeler", at(1, 10), at(1, 14), None).unwrap();
        assert_eq!(fee.applied_promotion_id.as_deref(), Some("airport"));
        assert!(fee.has_promotions);
        assert!(approx(fee.promotion_discount, 10.0));
    }

    #[test]
    fn promotion_window_checked_against_entry() {
        let mut store = four_wheeler_store();
        store.set_promotions(vec![Promotion::new(
            at(2, 0),
            at(5, 0),
            Adjustment::fixed(25.0),
        )]);
        let fee = calculate_fee(&store.snapshot(), "4 Wheeler", at(1, 10), at(3, 10), None).unwrap();
        assert!(!fee.has_promotions);
        assert_eq!(fee.promotion_discount, 0.0);
    }

    #[test]
    fn tax_applies_to_discounted_subtotal() {
        let mut store = four_wheeler_store();
        store.apply_settings(CategorySettings::Tax(TaxPolicy::new(18.0)));
        store.set_promotions(vec![Promotion::new(
            at(1, 0),
            at(10, 0),
            Adjustment::fixed(50.0),
        )]);
        let fee = calculate_fee(&store.snapshot(), "4 Wheeler", at(1, 10), at(1, 14), None).unwrap();
        assert!(approx(fee.tax_amount, 9.0));
        assert!(approx(fee.total_fee, 59.0));
        assert!(approx(fee.reconstructed_total(), fee.total_fee));
    }

    #[test]
    fn identical_inputs_give_identical_fees() {
        let store = four_wheeler_store();
        let snapshot = store.snapshot();
        let a = calculate_fee(&snapshot, "4 Wheeler", at(1, 10), at(4, 3), None).unwrap();
        let b = calculate_fee(&snapshot, "4 Wheeler", at(1, 10), at(4, 3), None).unwrap();
        assert_eq!(
            FeeCalculationResult {
                calculation_timestamp: b.calculation_timestamp,
                ..a
            },
            b
        );
    }

    #[test]
    fn estimate_uses_started_days() {
        let store = RateConfigStore::with_default_rates();
        let snapshot = store.snapshot();
        for (hours, expected) in [(1.0, 100.0), (24.0, 100.0), (25.0, 200.0), (48.0, 200.0), (49.0, 300.0)] {
            let estimate = estimate_fee(&snapshot, "4 Wheeler", hours).unwrap();
            assert!(approx(estimate, expected), "{hours}h -> {estimate}");
        }
        assert!(approx(estimate_fee(&snapshot, "Trailer", 72.0).unwrap(), 675.0));
    }

    #[test]
    fn estimate_rejects_bad_durations() {
        let store = RateConfigStore::with_default_rates();
        let snapshot = store.snapshot();
        assert_matches!(estimate_fee(&snapshot, "4 Wheeler", 0.0), Err(CoreError::Validation(_)));
        assert_matches!(
            estimate_fee(&snapshot, "4 Wheeler", f64::NAN),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            estimate_fee(&snapshot, "Bus", 4.0),
            Err(CoreError::UnknownVehicleType(_))
        );
    }

    #[test]
    fn overstay_penalty_per_started_hour() {
        let rate = RateConfig::new("4 Wheeler", 100.0).with_overstay(24.0, 40.0);
        assert_eq!(overstay_penalty_for(&rate, 24.0), 0.0);
        assert!(approx(overstay_penalty_for(&rate, 24.5), 40.0));
        assert!(approx(overstay_penalty_for(&rate, 30.0), 240.0));
    }

    #[test]
    fn schedule_lists_active_rates() {
        let mut store = RateConfigStore::with_default_rates();
        store
            .upsert_rate(RateConfig::new("Bus", 400.0).inactive())
            .unwrap();
        let schedule = rate_schedule(&store.snapshot());
        let types: Vec<_> = schedule.entries.iter().map(|e| e.vehicle_type.as_str()).collect();
        assert_eq!(types, vec!["2 Wheeler", "4 Wheeler", "6 Wheeler", "Trailer"]);
        assert!(schedule.method_description.contains("ceiling(hours/24)"));
        assert_eq!(schedule.tax_rate_percent, 0.0);
    }
}

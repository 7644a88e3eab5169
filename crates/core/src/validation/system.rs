//! Full-configuration check battery.
//!
//! Each check inspects one concern and contributes zero or more issues.
//! Checks run in a fixed order and never short-circuit each other.

use std::collections::HashSet;

use super::auto_fix::AutoFixAction;
use super::issue::{ValidationIssue, ValidationReport};
use crate::rate_config::{RateConfig, TIER_ORDER};
use crate::settings::{SettingsCategory, MINUTES_PER_DAY, PAYMENT_CASH};
use crate::store::ConfigSnapshot;
use crate::thresholds::{is_percent, HIGH_BASE_RATE};

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Operating windows shorter than this are reported as a warning.
pub const MIN_OPERATING_MINUTES: u32 = 8 * 60;

/// Minimum-charge periods longer than this are reported as a warning.
pub const MAX_MINIMUM_CHARGE_DAYS: u32 = 7;

/// API timeouts below this are reported; also the auto-fix value.
pub const MIN_API_TIMEOUT_MS: u64 = 5000;

/// Percent discounts below this would more than cancel the base fee.
pub const MIN_PERCENT_MODIFIER: f64 = -100.0;

type Check = fn(&ConfigSnapshot, &mut Vec<ValidationIssue>);

/// Checks in execution order.
const CHECKS: &[Check] = &[
    check_base_rates,
    check_rate_hierarchy,
    check_high_rates,
    check_rate_fields,
    check_operating_hours,
    check_payment_methods,
    check_minimum_charge_days,
    check_session_timeout,
    check_api_timeout,
    check_tax_policy,
    check_modifiers,
    check_promotions,
];

/// Validate an entire configuration snapshot.
pub fn validate_complete_system(snapshot: &ConfigSnapshot) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for check in CHECKS {
        check(snapshot, &mut issues);
    }
    tracing::debug!(
        version = snapshot.version(),
        issue_count = issues.len(),
        "Validated configuration snapshot"
    );
    issues
}

/// Validate and wrap the issues in a [`ValidationReport`].
pub fn validate_snapshot_report(snapshot: &ConfigSnapshot) -> ValidationReport {
    ValidationReport::new(snapshot.version(), validate_complete_system(snapshot))
}

fn rate_key(vehicle_type: &str, field: &str) -> String {
    format!("rates.{vehicle_type}.{field}")
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

fn check_base_rates(snapshot: &ConfigSnapshot, issues: &mut Vec<ValidationIssue>) {
    for rate in snapshot.all() {
        if rate.base_rate.is_nan() || rate.base_rate <= 0.0 {
            issues.push(
                ValidationIssue::error(
                    format!("rate.non_positive:{}", rate.vehicle_type),
                    SettingsCategory::Rates,
                    rate_key(&rate.vehicle_type, "baseRate"),
                    format!(
                        "Base rate for '{}' must be greater than zero, got {}",
                        rate.vehicle_type, rate.base_rate
                    ),
                )
                .with_suggestion("Set a positive daily rate or deactivate this vehicle type"),
            );
        }
    }
}

fn check_rate_hierarchy(snapshot: &ConfigSnapshot, issues: &mut Vec<ValidationIssue>) {
    let mut tiers: Vec<&RateConfig> = snapshot
        .all()
        .filter(|r| r.is_active && r.tier_index().is_some())
        .collect();
    tiers.sort_by_key(|r| r.tier_index());

    let violations: Vec<(&RateConfig, &RateConfig)> = tiers
        .windows(2)
        .map(|w| (w[0], w[1]))
        .filter(|(lower, higher)| lower.base_rate >= higher.base_rate)
        .collect();
    if violations.is_empty() {
        return;
    }

    // One shared fix: same tiers, rates sorted ascending. Equal rates stay
    // equal after sorting, so no reorder can satisfy the check.
    let mut sorted_rates: Vec<f64> = tiers.iter().map(|r| r.base_rate).collect();
    sorted_rates.sort_by(f64::total_cmp);
    let fix = sorted_rates
        .windows(2)
        .all(|w| w[0] < w[1])
        .then(|| AutoFixAction::ReorderRateHierarchy {
            rates: tiers
                .iter()
                .zip(sorted_rates.iter().copied())
                .map(|(r, rate)| (r.vehicle_type.clone(), rate))
                .collect(),
        });

    for (lower, higher) in violations {
        let issue = ValidationIssue::warning(
            format!("rate.hierarchy:{}>{}", lower.vehicle_type, higher.vehicle_type),
            SettingsCategory::Rates,
            rate_key(&lower.vehicle_type, "baseRate"),
            format!(
                "'{}' rate ({}) should be lower than '{}' rate ({})",
                lower.vehicle_type, lower.base_rate, higher.vehicle_type, higher.base_rate
            ),
        );
        issues.push(match &fix {
            Some(fix) => issue
                .with_suggestion(format!(
                    "Re-sort rates ascending by tier: {}",
                    TIER_ORDER.join(" < ")
                ))
                .with_auto_fix(fix.clone()),
            None => issue.with_suggestion("Give each tier a distinct rate, ascending by tier"),
        });
    }
}

fn check_high_rates(snapshot: &ConfigSnapshot, issues: &mut Vec<ValidationIssue>) {
    for rate in snapshot.all().filter(|r| r.base_rate > HIGH_BASE_RATE) {
        issues.push(
            ValidationIssue::warning(
                format!("rate.unusually_high:{}", rate.vehicle_type),
                SettingsCategory::Rates,
                rate_key(&rate.vehicle_type, "baseRate"),
                format!(
                    "Base rate for '{}' ({}) is unusually high",
                    rate.vehicle_type, rate.base_rate
                ),
            )
            .with_suggestion(format!("Confirm rates above {HIGH_BASE_RATE} are intended")),
        );
    }
}

/// Per-field sanity beyond the base rate, plus duplicate keys.
fn check_rate_fields(snapshot: &ConfigSnapshot, issues: &mut Vec<ValidationIssue>) {
    let mut seen = HashSet::new();
    for rate in snapshot.all() {
        let vt = &rate.vehicle_type;
        if !seen.insert(vt.as_str()) {
            issues.push(ValidationIssue::error(
                format!("rate.duplicate:{vt}"),
                SettingsCategory::Rates,
                rate_key(vt, "vehicleType"),
                format!("Vehicle type '{vt}' is configured more than once"),
            ));
        }
        if rate.minimum_charge.is_nan() || rate.minimum_charge < 0.0 {
            issues.push(ValidationIssue::error(
                format!("rate.negative_minimum:{vt}"),
                SettingsCategory::Rates,
                rate_key(vt, "minimumCharge"),
                format!(
                    "Minimum charge for '{vt}' must not be negative, got {}",
                    rate.minimum_charge
                ),
            ));
        }
        if rate.overstay_threshold_hours.is_nan() || rate.overstay_threshold_hours <= 0.0 {
            issues.push(ValidationIssue::error(
                format!("rate.invalid_overstay_threshold:{vt}"),
                SettingsCategory::Rates,
                rate_key(vt, "overstayThresholdHours"),
                format!(
                    "Overstay threshold for '{vt}' must be greater than zero, got {}",
                    rate.overstay_threshold_hours
                ),
            ));
        }
        if rate.overstay_penalty_rate.is_nan() || rate.overstay_penalty_rate < 0.0 {
            issues.push(ValidationIssue::error(
                format!("rate.negative_penalty:{vt}"),
                SettingsCategory::Rates,
                rate_key(vt, "overstayPenaltyRate"),
                format!(
                    "Overstay penalty rate for '{vt}' must not be negative, got {}",
                    rate.overstay_penalty_rate
                ),
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Business settings
// ---------------------------------------------------------------------------

fn check_operating_hours(snapshot: &ConfigSnapshot, issues: &mut Vec<ValidationIssue>) {
    let hours = snapshot.settings().business.operating_hours;
    const KEY: &str = "business.operatingHours";

    if !hours.is_in_range() {
        issues.push(ValidationIssue::error(
            "business.hours_out_of_range",
            SettingsCategory::Business,
            KEY,
            format!(
                "Operating hours must lie within 00:00-24:00, got {}..{} minutes",
                hours.open_minute, hours.close_minute
            ),
        ));
    }

    let Some(duration) = hours.duration_minutes() else {
        issues.push(
            ValidationIssue::error(
                "business.hours_inverted",
                SettingsCategory::Business,
                KEY,
                "Opening time must be before closing time",
            )
            .with_suggestion("Set a closing time later than the opening time"),
        );
        return;
    };

    if duration >= MINUTES_PER_DAY {
        issues.push(ValidationIssue::info(
            "business.hours_24_7",
            SettingsCategory::Business,
            KEY,
            "24/7 operation detected, confirm this is intended",
        ));
    } else if duration < MIN_OPERATING_MINUTES {
        issues.push(
            ValidationIssue::warning(
                "business.hours_short",
                SettingsCategory::Business,
                KEY,
                format!("Operating hours are only {:.1} hours per day", f64::from(duration) / 60.0),
            )
            .with_suggestion("Most facilities operate at least 8 hours per day"),
        );
    }
}

fn check_payment_methods(snapshot: &ConfigSnapshot, issues: &mut Vec<ValidationIssue>) {
    let methods = &snapshot.settings().business.payment_methods;
    const KEY: &str = "business.paymentMethods";

    match methods.as_slice() {
        [] => issues.push(
            ValidationIssue::error(
                "business.no_payment_methods",
                SettingsCategory::Business,
                KEY,
                "At least one payment method must be enabled",
            )
            .with_suggestion("Enable Cash payments")
            .with_auto_fix(AutoFixAction::SetPaymentMethods {
                methods: vec![PAYMENT_CASH.to_string()],
            }),
        ),
        [only] if only.trim().eq_ignore_ascii_case(PAYMENT_CASH) => issues.push(
            ValidationIssue::info(
                "business.cash_only",
                SettingsCategory::Business,
                KEY,
                "Only cash payments are accepted",
            )
            .with_suggestion("Consider enabling card or digital payments"),
        ),
        _ => {}
    }
}

fn check_minimum_charge_days(snapshot: &ConfigSnapshot, issues: &mut Vec<ValidationIssue>) {
    let days = snapshot.settings().business.minimum_charge_days;
    if days > MAX_MINIMUM_CHARGE_DAYS {
        issues.push(ValidationIssue::warning(
            "business.minimum_charge_days_high",
            SettingsCategory::Business,
            "business.minimumChargeDays",
            format!("Minimum charge period of {days} days exceeds {MAX_MINIMUM_CHARGE_DAYS} days"),
        ));
    }
}

// ---------------------------------------------------------------------------
// Cross-category
// ---------------------------------------------------------------------------

fn check_session_timeout(snapshot: &ConfigSnapshot, issues: &mut Vec<ValidationIssue>) {
    let settings = snapshot.settings();
    let Some(operating) = settings.business.operating_hours.duration_minutes() else {
        return;
    };
    let timeout = settings.security.session_inactivity_timeout_minutes;
    // Rounded up so the fix value always clears the check.
    let half_shift = operating.div_ceil(2);

    if u64::from(timeout) * 2 < u64::from(operating) {
        issues.push(
            ValidationIssue::warning(
                "cross.session_timeout_short",
                SettingsCategory::CrossCategory,
                "security.sessionInactivityTimeoutMinutes",
                format!(
                    "Session inactivity timeout ({timeout} min) is shorter than half the \
                     operating day ({half_shift} min)"
                ),
            )
            .with_suggestion(format!("Raise the timeout to {half_shift} minutes"))
            .with_auto_fix(AutoFixAction::SetSessionInactivityTimeout {
                minutes: half_shift,
            }),
        );
    }
}

fn check_api_timeout(snapshot: &ConfigSnapshot, issues: &mut Vec<ValidationIssue>) {
    let timeout = snapshot.settings().performance.api_timeout_ms;
    if timeout < MIN_API_TIMEOUT_MS {
        issues.push(
            ValidationIssue::warning(
                "cross.api_timeout_short",
                SettingsCategory::CrossCategory,
                "performance.apiTimeoutMs",
                format!("API timeout of {timeout} ms may abort fee calculations under load"),
            )
            .with_suggestion(format!("Raise the API timeout to at least {MIN_API_TIMEOUT_MS} ms"))
            .with_auto_fix(AutoFixAction::SetApiTimeout {
                ms: MIN_API_TIMEOUT_MS,
            }),
        );
    }
}

fn check_tax_policy(snapshot: &ConfigSnapshot, issues: &mut Vec<ValidationIssue>) {
    let rate = snapshot.settings().tax.rate_percent;
    if !is_percent(rate) {
        issues.push(ValidationIssue::error(
            "tax.rate_out_of_range",
            SettingsCategory::Tax,
            "tax.ratePercent",
            format!("Tax rate must be between 0 and 100 percent, got {rate}"),
        ));
    }
}

// ---------------------------------------------------------------------------
// Modifiers / promotions
// ---------------------------------------------------------------------------

fn known_vehicle_types(snapshot: &ConfigSnapshot) -> HashSet<&str> {
    snapshot.all().map(|r| r.vehicle_type.as_str()).collect()
}

fn check_modifiers(snapshot: &ConfigSnapshot, issues: &mut Vec<ValidationIssue>) {
    let known = known_vehicle_types(snapshot);
    let mut seen = HashSet::new();

    for m in snapshot.modifiers().iter() {
        let key = format!("modifiers.{}", m.id);
        if !seen.insert(m.id.as_str()) {
            issues.push(ValidationIssue::error(
                format!("modifier.duplicate_id:{}", m.id),
                SettingsCategory::Modifiers,
                key.clone(),
                format!("Modifier id '{}' is used more than once", m.id),
            ));
        }
        if !m.adjustment.amount().is_finite() {
            issues.push(ValidationIssue::error(
                format!("modifier.non_finite:{}", m.id),
                SettingsCategory::Modifiers,
                format!("{key}.adjustment"),
                "Modifier amount must be a finite number",
            ));
        }
        if m.adjustment.kind() == "percent" && m.adjustment.amount() < MIN_PERCENT_MODIFIER {
            issues.push(ValidationIssue::error(
                format!("modifier.percent_below_floor:{}", m.id),
                SettingsCategory::Modifiers,
                format!("{key}.adjustment"),
                format!(
                    "Percent modifier of {}% removes more than the whole base fee",
                    m.adjustment.amount()
                ),
            ));
        }
        if let Some(range) = m.applies_to.hour_range {
            if !range.is_well_formed() {
                issues.push(ValidationIssue::error(
                    format!("modifier.invalid_hour_range:{}", m.id),
                    SettingsCategory::Modifiers,
                    format!("{key}.appliesTo.hourRange"),
                    format!(
                        "Hour range [{}, {}] must use hours 0-24 and must not be empty",
                        range.start(),
                        range.end()
                    ),
                ));
            }
        }
        if matches!(&m.applies_to.days_of_week, Some(days) if days.is_empty()) {
            issues.push(ValidationIssue::warning(
                format!("modifier.no_days:{}", m.id),
                SettingsCategory::Modifiers,
                format!("{key}.appliesTo.daysOfWeek"),
                "Modifier lists no days of week and will never apply",
            ));
        }
        for vt in m.applies_to.vehicle_types.iter().flatten() {
            if !known.contains(vt.as_str()) {
                issues.push(ValidationIssue::warning(
                    format!("modifier.unknown_vehicle_type:{}:{vt}", m.id),
                    SettingsCategory::Modifiers,
                    format!("{key}.appliesTo.vehicleTypes"),
                    format!("Modifier references unknown vehicle type '{vt}'"),
                ));
            }
        }
    }
}

fn check_promotions(snapshot: &ConfigSnapshot, issues: &mut Vec<ValidationIssue>) {
    let known = known_vehicle_types(snapshot);
    let mut seen = HashSet::new();

    for p in snapshot.promotions().iter() {
        let key = format!("promotions.{}", p.id);
        if !seen.insert(p.id.as_str()) {
            issues.push(ValidationIssue::error(
                format!("promotion.duplicate_id:{}", p.id),
                SettingsCategory::Promotions,
                key.clone(),
                format!("Promotion id '{}' is used more than once", p.id),
            ));
        }
        if p.valid_from >= p.valid_to {
            issues.push(ValidationIssue::error(
                format!("promotion.invalid_window:{}", p.id),
                SettingsCategory::Promotions,
                format!("{key}.validTo"),
                format!(
                    "Promotion validity {} .. {} is empty; validFrom must precede validTo",
                    p.valid_from, p.valid_to
                ),
            ));
        }
        let amount = p.discount.amount();
        if amount.is_nan() || amount < 0.0 {
            issues.push(ValidationIssue::error(
                format!("promotion.negative_discount:{}", p.id),
                SettingsCategory::Promotions,
                format!("{key}.discount"),
                format!("Promotion discount must not be negative, got {amount}"),
            ));
        }
        if p.discount.kind() == "percent" && amount > 100.0 {
            issues.push(ValidationIssue::warning(
                format!("promotion.percent_over_100:{}", p.id),
                SettingsCategory::Promotions,
                format!("{key}.discount"),
                format!("Promotion discount of {amount}% exceeds the base fee"),
            ));
        }
        for vt in p.vehicle_types.iter().flatten() {
            if !known.contains(vt.as_str()) {
                issues.push(ValidationIssue::warning(
                    format!("promotion.unknown_vehicle_type:{}:{vt}", p.id),
                    SettingsCategory::Promotions,
                    format!("{key}.vehicleTypes"),
                    format!("Promotion references unknown vehicle type '{vt}'"),
                ));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

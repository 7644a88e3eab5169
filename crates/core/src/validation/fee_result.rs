//! Consistency checks on a computed [`FeeCalculationResult`].

use super::issue::{ValidationIssue, ValidationResult};
use crate::fee::FeeCalculationResult;
use crate::settings::SettingsCategory;
use crate::types::money_eq;

/// Check that a result's components are non-negative, agree with each other
/// and add up to its total.
///
/// `modifier_fees` may be negative (discount modifiers) and is not checked
/// for sign.
pub fn validate_fee_calculation(result: &FeeCalculationResult) -> ValidationResult {
    let mut issues = Vec::new();
    let cat = SettingsCategory::FeeCalculation;

    let components = [
        ("totalFee", result.total_fee),
        ("baseFee", result.base_fee),
        ("overstayPenalty", result.overstay_penalty),
        ("promotionDiscount", result.promotion_discount),
        ("taxAmount", result.tax_amount),
    ];
    for (field, value) in components {
        if value.is_nan() || value < 0.0 {
            issues.push(ValidationIssue::error(
                format!("fee.negative:{field}"),
                cat,
                field,
                format!("{field} must not be negative, got {value}"),
            ));
        }
    }

    let expected = result.reconstructed_total();
    if !money_eq(expected, result.total_fee) {
        issues.push(
            ValidationIssue::error(
                "fee.total_mismatch",
                cat,
                "totalFee",
                format!(
                    "Total fee {} does not match its components (expected {expected})",
                    result.total_fee
                ),
            )
            .with_suggestion("Recalculate the fee from the current configuration"),
        );
    }

    if result.is_overstay && result.overstay_penalty == 0.0 {
        issues.push(ValidationIssue::error(
            "fee.overstay_without_penalty",
            cat,
            "overstayPenalty",
            "Stay is flagged as overstay but no penalty was charged",
        ));
    }
    if !result.is_overstay && result.overstay_penalty > 0.0 {
        issues.push(ValidationIssue::error(
            "fee.penalty_without_overstay",
            cat,
            "isOverstay",
            format!(
                "Overstay penalty of {} charged on a stay not flagged as overstay",
                result.overstay_penalty
            ),
        ));
    }

    if result.calculated_days == 0 {
        issues.push(ValidationIssue::error(
            "fee.zero_days",
            cat,
            "calculatedDays",
            "At least one day must be billed",
        ));
    }
    if result.has_promotions != result.applied_promotion_id.is_some() {
        issues.push(ValidationIssue::warning(
            "fee.promotion_flag_mismatch",
            cat,
            "hasPromotions",
            "hasPromotions disagrees with the applied promotion id",
        ));
    }

    ValidationResult::from_issues(issues)
}

//! Tagged auto-fix actions carried by fixable validation issues.
//!
//! The validator only describes a fix; applying it is the caller's job
//! (see [`RateConfigStore::apply_auto_fix`](crate::store::RateConfigStore::apply_auto_fix)).

use serde::{Deserialize, Serialize};

use super::issue::ValidationIssue;

/// One variant per fixable issue kind, each carrying its replacement value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AutoFixAction {
    /// Reassign base rates so they ascend with tier order.
    /// Pairs are `(vehicle_type, new_base_rate)`.
    ReorderRateHierarchy { rates: Vec<(String, f64)> },
    SetPaymentMethods { methods: Vec<String> },
    SetSessionInactivityTimeout { minutes: u32 },
    SetApiTimeout { ms: u64 },
}

impl AutoFixAction {
    /// Dotted path of the setting the fix replaces.
    pub fn target_field(&self) -> &'static str {
        match self {
            Self::ReorderRateHierarchy { .. } => "rates.baseRate",
            Self::SetPaymentMethods { .. } => "business.paymentMethods",
            Self::SetSessionInactivityTimeout { .. } => "security.sessionInactivityTimeoutMinutes",
            Self::SetApiTimeout { .. } => "performance.apiTimeoutMs",
        }
    }

    /// Replacement value as JSON, for display next to the issue.
    pub fn replacement_value(&self) -> serde_json::Value {
        match self {
            Self::ReorderRateHierarchy { rates } => serde_json::Value::Object(
                rates
                    .iter()
                    .map(|(vehicle_type, rate)| (vehicle_type.clone(), serde_json::json!(rate)))
                    .collect(),
            ),
            Self::SetPaymentMethods { methods } => serde_json::json!(methods),
            Self::SetSessionInactivityTimeout { minutes } => serde_json::json!(minutes),
            Self::SetApiTimeout { ms } => serde_json::json!(ms),
        }
    }
}

/// Resolve the fix for `issue_id` from the latest validation run.
///
/// Returns `None` if the id is unknown or the issue is not auto-fixable.
pub fn find_auto_fix<'a>(issues: &'a [ValidationIssue], issue_id: &str) -> Option<&'a AutoFixAction> {
    issues
        .iter()
        .find(|i| i.id == issue_id)
        .and_then(|i| i.auto_fix_data.as_ref())
}

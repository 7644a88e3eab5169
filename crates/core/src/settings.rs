//! Typed settings schema, one struct per settings category.
//!
//! The validator's cross-category checks read named fields from these
//! structs; there is no stringly-typed lookup.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minutes in a full day. Valid as a closing time ("24:00").
pub const MINUTES_PER_DAY: u32 = 24 * 60;

pub const PAYMENT_CASH: &str = "Cash";
pub const PAYMENT_CARD: &str = "Card";

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Settings category, also used to group validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsCategory {
    Rates,
    Modifiers,
    Promotions,
    Business,
    Security,
    Performance,
    Tax,
    CrossCategory,
    FeeCalculation,
}

impl SettingsCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rates => "rates",
            Self::Modifiers => "modifiers",
            Self::Promotions => "promotions",
            Self::Business => "business",
            Self::Security => "security",
            Self::Performance => "performance",
            Self::Tax => "tax",
            Self::CrossCategory => "cross_category",
            Self::FeeCalculation => "fee_calculation",
        }
    }
}

// ---------------------------------------------------------------------------
// Business
// ---------------------------------------------------------------------------

/// Daily opening window in minutes since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingHours {
    pub open_minute: u32,
    pub close_minute: u32,
}

impl OperatingHours {
    pub fn new(open_minute: u32, close_minute: u32) -> Self {
        Self {
            open_minute,
            close_minute,
        }
    }

    pub fn is_in_range(&self) -> bool {
        self.open_minute < MINUTES_PER_DAY && self.close_minute <= MINUTES_PER_DAY
    }

    /// Open duration in minutes, or `None` when `open >= close`.
    pub fn duration_minutes(&self) -> Option<u32> {
        self.close_minute.checked_sub(self.open_minute).filter(|d| *d > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSettings {
    pub operating_hours: OperatingHours,
    pub payment_methods: Vec<String>,
    pub minimum_charge_days: u32,
    /// Facility offset from UTC, used to evaluate modifier windows.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        Self {
            operating_hours: OperatingHours::new(6 * 60, 22 * 60),
            payment_methods: vec![PAYMENT_CASH.to_string(), PAYMENT_CARD.to_string()],
            minimum_charge_days: 1,
            utc_offset_minutes: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Security / Performance / Tax
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySettings {
    pub session_inactivity_timeout_minutes: u32,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            session_inactivity_timeout_minutes: 8 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSettings {
    pub api_timeout_ms: u64,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            api_timeout_ms: 30_000,
        }
    }
}

/// Flat tax applied to the pre-tax fee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxPolicy {
    pub rate_percent: f64,
}

impl TaxPolicy {
    pub fn new(rate_percent: f64) -> Self {
        Self { rate_percent }
    }

    /// Tax on `taxable`, floored at zero before the rate is applied.
    pub fn tax_on(&self, taxable: f64) -> f64 {
        taxable.max(0.0) * self.rate_percent / 100.0
    }
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// All settings categories the engine reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemSettings {
    pub business: BusinessSettings,
    pub security: SecuritySettings,
    pub performance: PerformanceSettings,
    pub tax: TaxPolicy,
}

/// One category's settings, used to replace that category atomically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "settings", rename_all = "snake_case")]
pub enum CategorySettings {
    Business(BusinessSettings),
    Security(SecuritySettings),
    Performance(PerformanceSettings),
    Tax(TaxPolicy),
}

impl CategorySettings {
    pub fn category(&self) -> SettingsCategory {
        match self {
            Self::Business(_) => SettingsCategory::Business,
            Self::Security(_) => SettingsCategory::Security,
            Self::Performance(_) => SettingsCategory::Performance,
            Self::Tax(_) => SettingsCategory::Tax,
        }
    }
}

impl SystemSettings {
    pub fn apply(&mut self, update: CategorySettings) {
        match update {
            CategorySettings::Business(s) => self.business = s,
            CategorySettings::Security(s) => self.security = s,
            CategorySettings::Performance(s) => self.performance = s,
            CategorySettings::Tax(s) => self.tax = s,
        }
    }
}

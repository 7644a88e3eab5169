//! Per-vehicle-type rate configuration and the standard tariff.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::thresholds::finite_amount;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Vehicle types
// ---------------------------------------------------------------------------

pub const VEHICLE_TWO_WHEELER: &str = "2 Wheeler";
pub const VEHICLE_FOUR_WHEELER: &str = "4 Wheeler";
pub const VEHICLE_SIX_WHEELER: &str = "6 Wheeler";
pub const VEHICLE_TRAILER: &str = "Trailer";

/// Expected ascending order of daily rates by vehicle size.
pub const TIER_ORDER: &[&str] = &[
    VEHICLE_TWO_WHEELER,
    VEHICLE_FOUR_WHEELER,
    VEHICLE_SIX_WHEELER,
    VEHICLE_TRAILER,
];

/// Overstay threshold applied when none is configured explicitly.
pub const DEFAULT_OVERSTAY_THRESHOLD_HOURS: f64 = 24.0;

/// Standard daily tariff seeded into a fresh store.
pub const DEFAULT_RATES: &[(&str, f64)] = &[
    (VEHICLE_TWO_WHEELER, 50.0),
    (VEHICLE_FOUR_WHEELER, 100.0),
    (VEHICLE_SIX_WHEELER, 150.0),
    (VEHICLE_TRAILER, 225.0),
];

/// Size class of a vehicle type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleCategory {
    TwoWheeler,
    FourWheeler,
    SixWheeler,
    Trailer,
    Other,
}

impl VehicleCategory {
    /// Infer the category from a vehicle type key.
    pub fn from_vehicle_type(vehicle_type: &str) -> Self {
        match vehicle_type {
            VEHICLE_TWO_WHEELER => Self::TwoWheeler,
            VEHICLE_FOUR_WHEELER => Self::FourWheeler,
            VEHICLE_SIX_WHEELER => Self::SixWheeler,
            VEHICLE_TRAILER => Self::Trailer,
            _ => Self::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// RateConfig
// ---------------------------------------------------------------------------

/// Billing rules for one vehicle type.
///
/// `minimum_charge` may legitimately exceed `base_rate`. A positive
/// `base_rate` is only required while the config is active; the validator
/// reports violations rather than this type rejecting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RateConfig {
    #[validate(length(min = 1, max = 64))]
    pub vehicle_type: String,
    #[validate(custom(function = "finite_amount"))]
    pub base_rate: f64,
    #[validate(custom(function = "finite_amount"))]
    pub minimum_charge: f64,
    pub category: VehicleCategory,
    #[validate(custom(function = "finite_amount"))]
    pub overstay_threshold_hours: f64,
    #[validate(custom(function = "finite_amount"))]
    pub overstay_penalty_rate: f64,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RateConfig {
    /// Active config with no minimum charge and no overstay penalty.
    pub fn new(vehicle_type: impl Into<String>, base_rate: f64) -> Self {
        let vehicle_type = vehicle_type.into();
        let now = Utc::now();
        Self {
            category: VehicleCategory::from_vehicle_type(&vehicle_type),
            vehicle_type,
            base_rate,
            minimum_charge: 0.0,
            overstay_threshold_hours: DEFAULT_OVERSTAY_THRESHOLD_HOURS,
            overstay_penalty_rate: 0.0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_minimum_charge(mut self, minimum_charge: f64) -> Self {
        self.minimum_charge = minimum_charge;
        self
    }

    /// Set the overstay threshold and the per-excess-hour penalty.
    pub fn with_overstay(mut self, threshold_hours: f64, penalty_rate: f64) -> Self {
        self.overstay_threshold_hours = threshold_hours;
        self.overstay_penalty_rate = penalty_rate;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Position in [`TIER_ORDER`], if this is one of the standard tiers.
    pub fn tier_index(&self) -> Option<usize> {
        TIER_ORDER.iter().position(|t| *t == self.vehicle_type)
    }
}

/// The standard tariff as fresh rate configs.
pub fn default_rate_configs() -> Vec<RateConfig> {
    DEFAULT_RATES
        .iter()
        .map(|(vehicle_type, rate)| RateConfig::new(*vehicle_type, *rate))
        .collect()
}

//! Eligibility-scoped discounts. At most one promotion applies per stay.

use serde::{Deserialize, Serialize};

use crate::adjustment::Adjustment;
use crate::types::Timestamp;

/// A discount rule. Absent `vehicle_types` / `locations` match everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<String>>,
    pub valid_from: Timestamp,
    pub valid_to: Timestamp,
    pub discount: Adjustment,
}

impl Promotion {
    /// Create an unrestricted promotion with a generated id.
    pub fn new(valid_from: Timestamp, valid_to: Timestamp, discount: Adjustment) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            vehicle_types: None,
            locations: None,
            valid_from,
            valid_to,
            discount,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn for_vehicle_types<I, S>(mut self, vehicle_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vehicle_types = Some(vehicle_types.into_iter().map(Into::into).collect());
        self
    }

    pub fn at_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = Some(locations.into_iter().map(Into::into).collect());
        self
    }

    /// `[valid_from, valid_to)` contains `at`.
    pub fn is_valid_at(&self, at: Timestamp) -> bool {
        self.valid_from <= at && at < self.valid_to
    }

    /// Eligibility for a stay. The location constraint is only evaluated
    /// when the caller supplies a location.
    pub fn is_eligible(&self, vehicle_type: &str, location: Option<&str>, entry: Timestamp) -> bool {
        let vehicle_ok = self
            .vehicle_types
            .as_ref()
            .map_or(true, |types| types.iter().any(|t| t == vehicle_type));
        let location_ok = match (location, self.locations.as_ref()) {
            (Some(loc), Some(allowed)) => allowed.iter().any(|l| l == loc),
            _ => true,
        };
        vehicle_ok && location_ok && self.is_valid_at(entry)
    }

    /// Monetary discount against `base_fee`, never negative.
    pub fn discount_for(&self, base_fee: f64) -> f64 {
        self.discount.resolve(base_fee).max(0.0)
    }
}

/// Promotions in priority order (list order).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromotionSet {
    promotions: Vec<Promotion>,
}

impl PromotionSet {
    pub fn new(promotions: Vec<Promotion>) -> Self {
        Self { promotions }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Promotion> {
        self.promotions.iter()
    }

    pub fn len(&self) -> usize {
        self.promotions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty()
    }

    /// First eligible promotion in list order. No stacking.
    pub fn select(
        &self,
        vehicle_type: &str,
        location: Option<&str>,
        entry: Timestamp,
    ) -> Option<&Promotion> {
        self.promotions
            .iter()
            .find(|p| p.is_eligible(vehicle_type, location, entry))
    }
}

//! Fixed or percentage adjustments shared by modifiers and promotions.

use serde::{Deserialize, Serialize};

/// An amount applied against the base fee.
///
/// Serialized as `{"type": "fixed" | "percent", "amount": <number>}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Adjustment {
    /// Flat amount, added once.
    Fixed { amount: f64 },
    /// Percentage of the base fee.
    Percent { amount: f64 },
}

impl Adjustment {
    pub fn fixed(amount: f64) -> Self {
        Self::Fixed { amount }
    }

    pub fn percent(amount: f64) -> Self {
        Self::Percent { amount }
    }

    /// The raw configured amount, regardless of kind.
    pub fn amount(&self) -> f64 {
        match *self {
            Self::Fixed { amount } | Self::Percent { amount } => amount,
        }
    }

    /// Resolve the adjustment to a monetary value against `base_fee`.
    pub fn resolve(&self, base_fee: f64) -> f64 {
        match *self {
            Self::Fixed { amount } => amount,
            Self::Percent { amount } => base_fee * amount / 100.0,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::Percent { .. } => "percent",
        }
    }
}

//! Parking business rules engine.
//!
//! Pure computation over an immutable configuration snapshot: fee
//! calculation for a stay, and consistency validation of the rate,
//! modifier, promotion and settings configuration. No I/O, no async.

pub mod adjustment;
pub mod error;
pub mod fee;
pub mod modifier;
pub mod promotion;
pub mod rate_config;
pub mod settings;
pub mod store;
pub mod thresholds;
pub mod types;
pub mod validation;

pub use error::CoreError;
pub use fee::{calculate_fee, FeeCalculationResult};
pub use store::{ConfigSnapshot, RateConfigStore, SharedConfigStore};
pub use validation::{validate_complete_system, validate_fee_calculation};

use crate::types::Timestamp;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid time range: exit {exit} must be after entry {entry}")]
    InvalidTimeRange { entry: Timestamp, exit: Timestamp },

    #[error("Unknown vehicle type: '{0}'")]
    UnknownVehicleType(String),

    #[error("Rate configuration for '{0}' is inactive")]
    InactiveRateConfig(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

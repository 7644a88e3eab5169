//! Business rules validation.
//!
//! Provides issue types, the full-configuration check battery, result
//! consistency checks and auto-fix actions. Validation never fails: every
//! problem, including malformed input, is reported as a [`ValidationIssue`].

pub mod auto_fix;
pub mod fee_result;
pub mod issue;
pub mod system;

pub use auto_fix::{find_auto_fix, AutoFixAction};
pub use fee_result::validate_fee_calculation;
pub use issue::{ValidationIssue, ValidationReport, ValidationResult, ValidationSeverity};
pub use system::{validate_complete_system, validate_snapshot_report};

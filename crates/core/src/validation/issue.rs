//! Validation issue and report types.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::auto_fix::AutoFixAction;
use crate::settings::SettingsCategory;
use crate::types::{SnapshotVersion, Timestamp};

/// Whether an issue blocks, warns, or is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

/// A single configuration or result inconsistency.
///
/// Created fresh on every validation run. `id` is stable across runs for
/// the same problem, so a caller can resolve a fix by id after re-running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub id: String,
    pub category: SettingsCategory,
    pub setting_key: String,
    pub severity: ValidationSeverity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    pub auto_fixable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_fix_data: Option<AutoFixAction>,
}

impl ValidationIssue {
    fn new(
        severity: ValidationSeverity,
        id: impl Into<String>,
        category: SettingsCategory,
        setting_key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            setting_key: setting_key.into(),
            severity,
            message: message.into(),
            suggestion: None,
            auto_fixable: false,
            auto_fix_data: None,
        }
    }

    pub fn error(
        id: impl Into<String>,
        category: SettingsCategory,
        setting_key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ValidationSeverity::Error, id, category, setting_key, message)
    }

    pub fn warning(
        id: impl Into<String>,
        category: SettingsCategory,
        setting_key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ValidationSeverity::Warning, id, category, setting_key, message)
    }

    pub fn info(
        id: impl Into<String>,
        category: SettingsCategory,
        setting_key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ValidationSeverity::Info, id, category, setting_key, message)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach a fix; marks the issue auto-fixable.
    pub fn with_auto_fix(mut self, action: AutoFixAction) -> Self {
        self.auto_fixable = true;
        self.auto_fix_data = Some(action);
        self
    }
}

/// Outcome of checking one fee calculation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self {
            is_valid: !issues
                .iter()
                .any(|i| i.severity == ValidationSeverity::Error),
            issues,
        }
    }
}

/// Issues from one full-configuration run with per-severity counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub snapshot_version: SnapshotVersion,
    pub generated_at: Timestamp,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new(snapshot_version: SnapshotVersion, issues: Vec<ValidationIssue>) -> Self {
        let count = |s| issues.iter().filter(|i| i.severity == s).count();
        Self {
            snapshot_version,
            generated_at: Utc::now(),
            error_count: count(ValidationSeverity::Error),
            warning_count: count(ValidationSeverity::Warning),
            info_count: count(ValidationSeverity::Info),
            issues,
        }
    }

    pub fn has_blocking_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn auto_fixable(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.auto_fixable)
    }
}

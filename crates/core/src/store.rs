//! Versioned configuration store with copy-on-write snapshots.
//!
//! [`RateConfigStore`] owns the live configuration. Every mutation bumps the
//! version; snapshots already handed out via [`RateConfigStore::snapshot`]
//! keep pointing at the old data and never change.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::modifier::{Modifier, ModifierSet};
use crate::promotion::{Promotion, PromotionSet};
use crate::rate_config::{default_rate_configs, RateConfig};
use crate::settings::{CategorySettings, SystemSettings};
use crate::types::SnapshotVersion;
use crate::validation::auto_fix::AutoFixAction;

// ---------------------------------------------------------------------------
// ConfigSnapshot
// ---------------------------------------------------------------------------

/// Immutable view of the full configuration at one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    #[serde(default)]
    version: SnapshotVersion,
    #[serde(default)]
    rates: Vec<RateConfig>,
    #[serde(default)]
    modifiers: ModifierSet,
    #[serde(default)]
    promotions: PromotionSet,
    #[serde(default)]
    settings: SystemSettings,
}

impl ConfigSnapshot {
    pub fn version(&self) -> SnapshotVersion {
        self.version
    }

    /// Look up the rate config for a vehicle type.
    pub fn get(&self, vehicle_type: &str) -> Result<&RateConfig, CoreError> {
        self.rates
            .iter()
            .find(|r| r.vehicle_type == vehicle_type)
            .ok_or_else(|| CoreError::UnknownVehicleType(vehicle_type.to_string()))
    }

    /// All rate configs in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &RateConfig> {
        self.rates.iter()
    }

    pub fn rates(&self) -> &[RateConfig] {
        &self.rates
    }

    pub fn modifiers(&self) -> &ModifierSet {
        &self.modifiers
    }

    pub fn promotions(&self) -> &PromotionSet {
        &self.promotions
    }

    pub fn settings(&self) -> &SystemSettings {
        &self.settings
    }

    fn empty() -> Self {
        Self {
            version: 1,
            rates: Vec::new(),
            modifiers: ModifierSet::default(),
            promotions: PromotionSet::default(),
            settings: SystemSettings::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// RateConfigStore
// ---------------------------------------------------------------------------

/// Live configuration. Single-writer; wrap in [`SharedConfigStore`] for
/// concurrent access.
#[derive(Debug, Clone)]
pub struct RateConfigStore {
    current: Arc<ConfigSnapshot>,
}

impl Default for RateConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RateConfigStore {
    /// Empty store at version 1 with default settings.
    pub fn new() -> Self {
        Self {
            current: Arc::new(ConfigSnapshot::empty()),
        }
    }

    /// Store seeded with the standard tariff.
    pub fn with_default_rates() -> Self {
        let mut snapshot = ConfigSnapshot::empty();
        snapshot.rates = default_rate_configs();
        Self {
            current: Arc::new(snapshot),
        }
    }

    /// Adopt an externally loaded snapshot as the live configuration.
    pub fn from_snapshot(snapshot: ConfigSnapshot) -> Self {
        Self {
            current: Arc::new(snapshot),
        }
    }

    pub fn version(&self) -> SnapshotVersion {
        self.current.version
    }

    pub fn get(&self, vehicle_type: &str) -> Result<&RateConfig, CoreError> {
        self.current.get(vehicle_type)
    }

    pub fn all(&self) -> impl Iterator<Item = &RateConfig> {
        self.current.all()
    }

    /// Immutable view of the current version.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        Arc::clone(&self.current)
    }

    /// Insert or replace the config for `config.vehicle_type`.
    ///
    /// Rejects structurally malformed input (empty key, non-finite numbers).
    /// Replacing keeps the original `created_at` and list position.
    pub fn upsert_rate(&mut self, mut config: RateConfig) -> Result<(), CoreError> {
        config
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        let now = Utc::now();
        self.mutate(|snapshot| {
            match snapshot
                .rates
                .iter_mut()
                .find(|r| r.vehicle_type == config.vehicle_type)
            {
                Some(existing) => {
                    config.created_at = existing.created_at;
                    config.updated_at = now;
                    *existing = config;
                }
                None => snapshot.rates.push(config),
            }
        });
        Ok(())
    }

    pub fn remove_rate(&mut self, vehicle_type: &str) -> Result<RateConfig, CoreError> {
        let index = self
            .current
            .rates
            .iter()
            .position(|r| r.vehicle_type == vehicle_type)
            .ok_or_else(|| CoreError::UnknownVehicleType(vehicle_type.to_string()))?;
        let mut removed = None;
        self.mutate(|snapshot| removed = Some(snapshot.rates.remove(index)));
        removed.ok_or_else(|| CoreError::Internal("rate removal produced no value".into()))
    }

    pub fn set_modifiers(&mut self, modifiers: Vec<Modifier>) {
        self.mutate(|snapshot| snapshot.modifiers = ModifierSet::new(modifiers));
    }

    pub fn set_promotions(&mut self, promotions: Vec<Promotion>) {
        self.mutate(|snapshot| snapshot.promotions = PromotionSet::new(promotions));
    }

    pub fn apply_settings(&mut self, update: CategorySettings) {
        self.mutate(|snapshot| snapshot.settings.apply(update));
    }

    /// Apply a validator-suggested fix.
    ///
    /// Fails without mutating when the fix references a vehicle type that no
    /// longer exists.
    pub fn apply_auto_fix(&mut self, action: &AutoFixAction) -> Result<(), CoreError> {
        match action {
            AutoFixAction::ReorderRateHierarchy { rates } => {
                for (vehicle_type, _) in rates {
                    self.get(vehicle_type)?;
                }
                let now = Utc::now();
                self.mutate(|snapshot| {
                    for (vehicle_type, base_rate) in rates {
                        if let Some(r) = snapshot
                            .rates
                            .iter_mut()
                            .find(|r| &r.vehicle_type == vehicle_type)
                        {
                            r.base_rate = *base_rate;
                            r.updated_at = now;
                        }
                    }
                });
            }
            AutoFixAction::SetPaymentMethods { methods } => {
                let methods = methods.clone();
                self.mutate(|snapshot| snapshot.settings.business.payment_methods = methods);
            }
            AutoFixAction::SetSessionInactivityTimeout { minutes } => {
                let minutes = *minutes;
                self.mutate(|snapshot| {
                    snapshot.settings.security.session_inactivity_timeout_minutes = minutes
                });
            }
            AutoFixAction::SetApiTimeout { ms } => {
                let ms = *ms;
                self.mutate(|snapshot| snapshot.settings.performance.api_timeout_ms = ms);
            }
        }
        tracing::debug!(
            target_field = %action.target_field(),
            version = self.version(),
            "Applied auto-fix"
        );
        Ok(())
    }

    /// Copy-on-write: clones the snapshot only if a reader still holds it.
    fn mutate(&mut self, f: impl FnOnce(&mut ConfigSnapshot)) {
        let snapshot = Arc::make_mut(&mut self.current);
        f(snapshot);
        snapshot.version += 1;
    }
}

// ---------------------------------------------------------------------------
// SharedConfigStore
// ---------------------------------------------------------------------------

/// Thread-safe handle to a [`RateConfigStore`].
///
/// `snapshot()` clones the current `Arc` under a read lock, so each caller
/// observes exactly one version regardless of concurrent writers.
#[derive(Debug, Clone, Default)]
pub struct SharedConfigStore {
    inner: Arc<RwLock<RateConfigStore>>,
}

impl SharedConfigStore {
    pub fn new(store: RateConfigStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Run a mutation under the write lock and return its result together
    /// with the snapshot it produced.
    pub fn update<R>(&self, f: impl FnOnce(&mut RateConfigStore) -> R) -> (R, Arc<ConfigSnapshot>) {
        let mut store = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut store);
        (result, store.snapshot())
    }
}

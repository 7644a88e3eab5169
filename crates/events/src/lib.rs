//! Configuration change propagation for the parking rules engine.
//!
//! - [`ConfigBus`] applies mutations to a shared store and publishes each
//!   new snapshot on a `tokio::sync::watch` channel, plus a change record on
//!   a `tokio::sync::broadcast` channel.
//! - [`ValidationScheduler`] watches snapshot publications, debounces bursts
//!   of edits and publishes a validation report for the newest snapshot.

pub mod bus;
pub mod scheduler;

pub use bus::{ConfigBus, ConfigChange};
pub use scheduler::{ScheduledReport, ValidationScheduler};

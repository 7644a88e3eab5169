//! Time-of-day and day-of-week fee adjustments.
//!
//! Windows are evaluated in facility local time: callers pass stay bounds
//! already shifted by the configured UTC offset.

use chrono::{Datelike, Duration, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::adjustment::Adjustment;

/// Hour slots in a week. Any stay at least this long touches every
/// (weekday, hour) combination.
const HOURS_PER_WEEK: usize = 7 * 24;

// ---------------------------------------------------------------------------
// HourRange
// ---------------------------------------------------------------------------

/// Half-open hour window `[start, end)`, serialized as `[start, end]`.
///
/// `start > end` wraps midnight, so `[22, 6]` covers 22:00-05:59.
/// `start == end` is empty and never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourRange(pub u8, pub u8);

impl HourRange {
    pub fn start(&self) -> u8 {
        self.0
    }

    pub fn end(&self) -> u8 {
        self.1
    }

    /// Both bounds lie within `0..=24` and the window is non-empty.
    pub fn is_well_formed(&self) -> bool {
        self.0 <= 24 && self.1 <= 24 && self.0 != self.1
    }

    pub fn contains(&self, hour: u32) -> bool {
        let (start, end) = (u32::from(self.0), u32::from(self.1));
        if start < end {
            (start..end).contains(&hour)
        } else if start > end {
            hour >= start || hour < end
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Applicability
// ---------------------------------------------------------------------------

/// Applicability predicate. Absent fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliesTo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<Weekday>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour_range: Option<HourRange>,
}

impl AppliesTo {
    pub fn matches_vehicle(&self, vehicle_type: &str) -> bool {
        self.vehicle_types
            .as_ref()
            .map_or(true, |types| types.iter().any(|t| t == vehicle_type))
    }

    fn matches_slot(&self, weekday: Weekday, hour: u32) -> bool {
        let day_ok = self
            .days_of_week
            .as_ref()
            .map_or(true, |days| days.contains(&weekday));
        let hour_ok = self.hour_range.map_or(true, |range| range.contains(hour));
        day_ok && hour_ok
    }

    /// Whether any hour slot of the local stay `[entry, exit)` satisfies the
    /// day-of-week and hour-range constraints.
    pub fn intersects_stay(&self, entry: NaiveDateTime, exit: NaiveDateTime) -> bool {
        if self.days_of_week.is_none() && self.hour_range.is_none() {
            return true;
        }

        let mut slot = truncate_to_hour(entry);
        for _ in 0..HOURS_PER_WEEK {
            if slot >= exit {
                break;
            }
            if self.matches_slot(slot.weekday(), slot.hour()) {
                return true;
            }
            slot += Duration::hours(1);
        }
        false
    }
}

fn truncate_to_hour(t: NaiveDateTime) -> NaiveDateTime {
    t - Duration::minutes(i64::from(t.minute()))
        - Duration::seconds(i64::from(t.second()))
        - Duration::nanoseconds(i64::from(t.nanosecond()))
}

// ---------------------------------------------------------------------------
// Modifier / ModifierSet
// ---------------------------------------------------------------------------

/// A surcharge (positive amount) or discount (negative amount) scoped to a
/// time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modifier {
    pub id: String,
    #[serde(default)]
    pub applies_to: AppliesTo,
    pub adjustment: Adjustment,
}

impl Modifier {
    /// Create a modifier with a generated id.
    pub fn new(applies_to: AppliesTo, adjustment: Adjustment) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            applies_to,
            adjustment,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn applies(&self, vehicle_type: &str, entry: NaiveDateTime, exit: NaiveDateTime) -> bool {
        self.applies_to.matches_vehicle(vehicle_type) && self.applies_to.intersects_stay(entry, exit)
    }
}

/// Ordered modifiers. All applicable entries stack additively in list order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierSet {
    modifiers: Vec<Modifier>,
}

impl ModifierSet {
    pub fn new(modifiers: Vec<Modifier>) -> Self {
        Self { modifiers }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.iter()
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Modifiers applicable to a stay, in list order.
    pub fn applicable<'a>(
        &'a self,
        vehicle_type: &'a str,
        entry: NaiveDateTime,
        exit: NaiveDateTime,
    ) -> impl Iterator<Item = &'a Modifier> + 'a {
        self.modifiers
            .iter()
            .filter(move |m| m.applies(vehicle_type, entry, exit))
    }
}

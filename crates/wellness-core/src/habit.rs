//! Habit categories and log entries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Tracked habit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitType {
    Sleep,
    Exercise,
    Water,
    Study,
}

impl HabitType {
    pub const ALL: [HabitType; 4] = [
        HabitType::Sleep,
        HabitType::Exercise,
        HabitType::Water,
        HabitType::Study,
    ];

    /// Storage and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            HabitType::Sleep => "sleep",
            HabitType::Exercise => "exercise",
            HabitType::Water => "water",
            HabitType::Study => "study",
        }
    }

    /// Unit used when a log does not name one.
    pub fn default_unit(self) -> &'static str {
        match self {
            HabitType::Sleep => "hours",
            HabitType::Exercise => "minutes",
            HabitType::Water => "glasses",
            HabitType::Study => "hours",
        }
    }
}

impl fmt::Display for HabitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HabitType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sleep" => Ok(HabitType::Sleep),
            "exercise" => Ok(HabitType::Exercise),
            "water" => Ok(HabitType::Water),
            "study" => Ok(HabitType::Study),
            other => Err(ValidationError::UnknownVariant {
                kind: "habit type",
                value: other.to_string(),
            }),
        }
    }
}

/// A stored habit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitLog {
    pub id: String,
    pub uid: String,
    pub habit_type: HabitType,
    pub value: f64,
    pub unit: String,
    /// When the habit happened (may differ from `created_at`).
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Incoming log request before defaults are applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHabitLog {
    pub habit_type: HabitType,
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewHabitLog {
    pub fn new(habit_type: HabitType, value: f64) -> Self {
        Self {
            habit_type,
            value,
            unit: None,
            timestamp: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// # Errors
    /// Rejects non-positive or non-finite values and blank units.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.value.is_finite() || self.value <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "value",
                message: format!("must be greater than 0, got {}", self.value),
            });
        }
        if let Some(unit) = &self.unit {
            if unit.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "unit",
                    message: "must not be blank".into(),
                });
            }
        }
        Ok(())
    }

    /// Explicit unit, or the habit's default.
    pub fn resolved_unit(&self) -> String {
        self.unit
            .as_deref()
            .map(str::trim)
            .unwrap_or_else(|| self.habit_type.default_unit())
            .to_string()
    }
}

/// Longest look-back any day window may use.
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Filter for listing a user's logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitLogQuery {
    pub habit_type: Option<HabitType>,
    pub days: u32,
}

impl HabitLogQuery {
    pub fn new(days: u32) -> Self {
        Self {
            habit_type: None,
            days,
        }
    }

    pub fn for_habit(mut self, habit_type: HabitType) -> Self {
        self.habit_type = Some(habit_type);
        self
    }

    /// # Errors
    /// `days` must fall in `1..=max_days`.
    pub fn validate(&self, max_days: u32) -> Result<(), ValidationError> {
        check_days("days", self.days, max_days)
    }
}

pub(crate) fn check_days(field: &'static str, days: u32, max: u32) -> Result<(), ValidationError> {
    if days == 0 || days > max {
        return Err(ValidationError::OutOfRange {
            field,
            min: 1,
            max: i64::from(max),
            actual: i64::from(days),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_units_per_habit() {
        assert_eq!(HabitType::Sleep.default_unit(), "hours");
        assert_eq!(HabitType::Exercise.default_unit(), "minutes");
        assert_eq!(HabitType::Water.default_unit(), "glasses");
        assert_eq!(HabitType::Study.default_unit(), "hours");
    }

    #[test]
    fn habit_type_string_roundtrip() {
        for habit in HabitType::ALL {
            assert_eq!(habit.as_str().parse::<HabitType>().unwrap(), habit);
        }
        assert!("meditation".parse::<HabitType>().is_err());
        assert!("Sleep".parse::<HabitType>().is_err());
    }

    #[test]
    fn habit_type_serde_matches_storage_string() {
        let json = serde_json::to_string(&HabitType::Exercise).unwrap();
        assert_eq!(json, "\"exercise\"");
    }

    #[test]
    fn rejects_non_positive_values() {
        assert!(NewHabitLog::new(HabitType::Water, 0.0).validate().is_err());
        assert!(NewHabitLog::new(HabitType::Water, -2.0).validate().is_err());
        assert!(NewHabitLog::new(HabitType::Water, f64::NAN).validate().is_err());
        assert!(NewHabitLog::new(HabitType::Water, 0.5).validate().is_ok());
    }

    #[test]
    fn rejects_blank_unit() {
        let log = NewHabitLog::new(HabitType::Study, 1.0).with_unit("  ");
        assert!(log.validate().is_err());
    }

    #[test]
    fn unit_falls_back_to_default() {
        assert_eq!(NewHabitLog::new(HabitType::Sleep, 8.0).resolved_unit(), "hours");
        assert_eq!(
            NewHabitLog::new(HabitType::Sleep, 8.0).with_unit(" naps ").resolved_unit(),
            "naps"
        );
    }

    #[test]
    fn query_days_bounds() {
        assert!(HabitLogQuery::new(0).validate(365).is_err());
        assert!(HabitLogQuery::new(1).validate(365).is_ok());
        assert!(HabitLogQuery::new(365).validate(365).is_ok());
        assert!(HabitLogQuery::new(366).validate(365).is_err());
    }
}

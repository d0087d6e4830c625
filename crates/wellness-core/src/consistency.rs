//! Weekly consistency score used for leaderboard ranking.
//!
//! The score counts logging events, not distinct days: three logs on Monday
//! count as three. Seven or more events in the window saturate at 100.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Days in the scoring window.
pub const WINDOW_DAYS: u32 = 7;

/// Percentage in `[0.0, 100.0]` with one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsistencyScore(f64);

impl ConsistencyScore {
    /// Score a trailing-week log count.
    ///
    /// Rounds half away from zero (`f64::round`), so 3 logs → 42.9.
    pub fn from_weekly_count(weekly_log_count: u32) -> Self {
        let ratio = f64::from(weekly_log_count) / f64::from(WINDOW_DAYS);
        let percent = (ratio * 100.0).min(100.0);
        Self((percent * 10.0).round() / 10.0)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for ConsistencyScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_logs_score_zero() {
        assert_eq!(ConsistencyScore::from_weekly_count(0).value(), 0.0);
    }

    #[test]
    fn partial_week_rounds_to_one_decimal() {
        assert_eq!(ConsistencyScore::from_weekly_count(3).value(), 42.9);
        assert_eq!(ConsistencyScore::from_weekly_count(1).value(), 14.3);
        assert_eq!(ConsistencyScore::from_weekly_count(5).value(), 71.4);
    }

    #[test]
    fn saturates_at_one_hundred() {
        assert_eq!(ConsistencyScore::from_weekly_count(7).value(), 100.0);
        assert_eq!(ConsistencyScore::from_weekly_count(10).value(), 100.0);
        assert_eq!(ConsistencyScore::from_weekly_count(u32::MAX).value(), 100.0);
    }

    #[test]
    fn display_keeps_one_decimal() {
        assert_eq!(ConsistencyScore::from_weekly_count(7).to_string(), "100.0");
        assert_eq!(ConsistencyScore::from_weekly_count(2).to_string(), "28.6");
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&ConsistencyScore::from_weekly_count(3)).unwrap();
        assert_eq!(json, "42.9");
    }
}

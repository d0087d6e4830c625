//! Streak computation over calendar days.
//!
//! Habit logs are reduced to the set of UTC calendar days on which at least
//! one entry exists ([`DateSet`]). [`StreakCalculator`] then derives two
//! numbers from that set:
//!
//! - the **current** streak: consecutive days ending at `today`. A day
//!   without a log today reports zero even if yesterday ended a long run.
//! - the **best** streak: the longest consecutive run anywhere in the set.
//!
//! Everything here is pure and allocation-light; results are recomputed per
//! request and never stored.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Unique calendar days on which a habit was logged.
///
/// Days are taken in UTC. Inserting the same day twice is a no-op, so
/// several logs on one day never inflate a streak.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateSet {
    days: BTreeSet<NaiveDate>,
}

impl DateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Truncate each timestamp to its UTC calendar day and deduplicate.
    pub fn from_timestamps<I>(timestamps: I) -> Self
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        timestamps.into_iter().map(|ts| ts.date_naive()).collect()
    }

    pub fn insert(&mut self, day: NaiveDate) -> bool {
        self.days.insert(day)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.days.contains(&day)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Days in ascending calendar order.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.iter().copied()
    }
}

impl FromIterator<NaiveDate> for DateSet {
    fn from_iter<T: IntoIterator<Item = NaiveDate>>(iter: T) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

/// How days after `today` are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FutureDates {
    /// Days after `today` are dropped before computing either streak.
    #[default]
    Ignore,
    /// Days after `today` take part in the best-streak scan.
    Include,
}

/// Current and best streak for one habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakResult {
    pub current_streak: u32,
    pub best_streak: u32,
}

/// Computes [`StreakResult`] from a [`DateSet`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StreakCalculator {
    future_dates: FutureDates,
}

impl StreakCalculator {
    /// Calculator that ignores future-dated days.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_future_dates(future_dates: FutureDates) -> Self {
        Self { future_dates }
    }

    pub fn compute(&self, dates: &DateSet, today: NaiveDate) -> StreakResult {
        if dates.is_empty() {
            return StreakResult::default();
        }

        StreakResult {
            current_streak: current_streak(dates, today),
            best_streak: self.best_streak(dates, today),
        }
    }

    fn best_streak(&self, dates: &DateSet, today: NaiveDate) -> u32 {
        let mut best = 0;
        let mut run = 0;
        let mut prev: Option<NaiveDate> = None;

        let days = dates
            .iter()
            .filter(|day| self.future_dates == FutureDates::Include || *day <= today);

        for day in days {
            run = match prev {
                Some(p) if p.succ_opt() == Some(day) => run + 1,
                _ => 1,
            };
            best = best.max(run);
            prev = Some(day);
        }

        best
    }
}

/// Walk backwards from `today` while each day is present.
fn current_streak(dates: &DateSet, today: NaiveDate) -> u32 {
    let mut count = 0;
    let mut cursor = Some(today);

    while let Some(day) = cursor.filter(|d| dates.contains(*d)) {
        count += 1;
        cursor = day.pred_opt();
    }

    count
}

/// Convenience wrapper using the default calculator.
pub fn compute_streak(dates: &DateSet, today: NaiveDate) -> StreakResult {
    StreakCalculator::new().compute(dates, today)
}

use chrono::{DateTime, Utc};
use clap::Subcommand;
use wellness_core::{HabitLogQuery, HabitType, NewHabitLog};

use super::{print_json, CommandResult, Session};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Record a habit entry
    Log {
        /// sleep, exercise, water or study
        habit: HabitType,
        value: f64,
        /// Unit (defaults per habit)
        #[arg(long)]
        unit: Option<String>,
        /// When it happened, RFC 3339 (defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// List recent entries, newest first
    Logs {
        #[arg(long)]
        habit: Option<HabitType>,
        /// Days to look back (defaults to logs.default_days)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Current and best streak for one habit
    Streak { habit: HabitType },
    /// Per-habit totals, streaks and recent entries
    Summary {
        /// Days to cover (defaults to logs.default_days, capped at logs.summary_max_days)
        #[arg(long)]
        days: Option<u32>,
    },
}

pub fn run(action: HabitAction, token: Option<&str>) -> CommandResult {
    let session = Session::open()?;
    let claims = session.claims(token)?;
    let service = session.service();
    let default_days = session.config.logs.default_days;

    match action {
        HabitAction::Log {
            habit,
            value,
            unit,
            at,
        } => {
            let mut new_log = NewHabitLog::new(habit, value);
            if let Some(unit) = unit {
                new_log = new_log.with_unit(unit);
            }
            if let Some(at) = at {
                new_log = new_log.at(at);
            }
            print_json(&service.log_habit(&claims, new_log)?)?;
        }
        HabitAction::Logs { habit, days } => {
            let mut query = HabitLogQuery::new(days.unwrap_or(default_days));
            if let Some(habit) = habit {
                query = query.for_habit(habit);
            }
            print_json(&service.habit_logs(&claims, query)?)?;
        }
        HabitAction::Streak { habit } => {
            print_json(&service.streak(&claims, habit)?)?;
        }
        HabitAction::Summary { days } => {
            let days = days.unwrap_or(default_days.min(session.config.logs.summary_max_days));
            print_json(&service.summary(&claims, days)?)?;
        }
    }
    session.close()?;
    Ok(())
}

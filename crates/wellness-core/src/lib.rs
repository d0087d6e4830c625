//! # Wellness Core Library
//!
//! This library provides the core business logic for the student wellness
//! tracker. Every operation is available through the standalone CLI binary,
//! which is a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Streaks**: pure computation of current and best consecutive-day runs
//!   over a set of calendar dates
//! - **Consistency**: weekly log count mapped to a 0-100 score
//! - **Groups**: join codes, memberships and ranked leaderboards
//! - **Auth**: signed identity tokens behind the [`TokenVerifier`] trait
//! - **Storage**: SQLite document storage and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`StreakCalculator`]: streak computation with a future-date policy
//! - [`WellnessService`]: the request-level operations
//! - [`Database`]: users, habit logs and groups
//! - [`Config`]: application configuration management

pub mod auth;
pub mod consistency;
pub mod error;
pub mod group;
pub mod habit;
pub mod service;
pub mod storage;
pub mod streak;
pub mod user;

pub use auth::{bearer_token, IdentityClaims, SignedTokenVerifier, TokenVerifier};
pub use consistency::ConsistencyScore;
pub use error::{AuthError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use group::{
    generate_join_code, normalize_join_code, Group, GroupMembership, GroupRole, GroupView,
    Leaderboard, LeaderboardEntry, MemberGroup, MyGroups, NewGroup,
};
pub use habit::{HabitLog, HabitLogQuery, HabitType, NewHabitLog};
pub use service::{HabitLogPage, HabitSummary, HabitSummaryEntry, StreakReport, WellnessService};
pub use storage::{Config, Database};
pub use streak::{compute_streak, DateSet, FutureDates, StreakCalculator, StreakResult};
pub use user::{User, UserProfile};

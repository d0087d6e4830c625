//! Request-level operations of the tracker.
//!
//! [`WellnessService`] borrows an open [`Database`], a [`TokenVerifier`] and
//! the [`Config`]. Each method takes the verified caller's [`IdentityClaims`]
//! and returns a serializable view. Streaks and consistency scores are
//! recomputed from stored logs on every call.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{bearer_token, IdentityClaims, TokenVerifier};
use crate::error::{CoreError, Result};
use crate::group::{
    generate_join_code, normalize_join_code, rank_entries, Group, GroupMembership, GroupRole,
    GroupView, Leaderboard, LeaderboardEntry, MemberGroup, MyGroups, NewGroup,
};
use crate::habit::{
    check_days, HabitLog, HabitLogQuery, HabitType, NewHabitLog, MAX_WINDOW_DAYS,
};
use crate::storage::{Config, Database};
use crate::streak::{DateSet, StreakCalculator, StreakResult};
use crate::user::{User, ANONYMOUS};

/// Page of a user's habit logs, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitLogPage {
    pub logs: Vec<HabitLog>,
    pub total_count: usize,
    pub days_requested: u32,
    /// `None` when all habits were requested.
    pub habit_type: Option<HabitType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakReport {
    pub habit_type: HabitType,
    #[serde(flatten)]
    pub streak: StreakResult,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitSummaryEntry {
    pub total_entries: usize,
    pub current_streak: u32,
    pub best_streak: u32,
    pub recent_logs: Vec<HabitLog>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitSummary {
    pub summary: BTreeMap<HabitType, HabitSummaryEntry>,
    pub days_covered: u32,
    pub user_id: String,
}

/// Start of the UTC day `days` before `now`. `days` is capped at
/// [`MAX_WINDOW_DAYS`].
pub fn window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    let day = now
        .date_naive()
        .checked_sub_days(Days::new(u64::from(days.min(MAX_WINDOW_DAYS))))
        .unwrap_or(NaiveDate::MIN);
    day.and_time(NaiveTime::MIN).and_utc()
}

/// `now` minus `days` whole days, capped like [`window_start`].
pub fn days_before(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::days(i64::from(days.min(MAX_WINDOW_DAYS))))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub struct WellnessService<'a, V: TokenVerifier + ?Sized> {
    db: &'a Database,
    verifier: &'a V,
    config: &'a Config,
    fixed_now: Option<DateTime<Utc>>,
}

impl<'a, V: TokenVerifier + ?Sized> WellnessService<'a, V> {
    pub fn new(db: &'a Database, verifier: &'a V, config: &'a Config) -> Self {
        Self {
            db,
            verifier,
            config,
            fixed_now: None,
        }
    }

    /// Pin the service clock.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    // === Identity ===

    pub fn authenticate(&self, token: &str) -> Result<IdentityClaims> {
        Ok(self.verifier.verify(token, self.now())?)
    }

    /// Authenticate from a raw `Authorization` header value.
    pub fn authenticate_header(&self, header: Option<&str>) -> Result<IdentityClaims> {
        self.authenticate(bearer_token(header)?)
    }

    /// Create or refresh the caller's stored profile.
    pub fn verify_user(&self, claims: &IdentityClaims) -> Result<User> {
        let user = self.db.upsert_user(&claims.uid, &claims.profile(), self.now())?;
        info!(uid = %user.uid, "user verified");
        Ok(user)
    }

    /// Profile as described by the token, with stored timestamps if any.
    pub fn current_user(&self, claims: &IdentityClaims) -> Result<User> {
        let stored = self.db.get_user(&claims.uid)?;
        let profile = claims.profile();
        Ok(User {
            uid: claims.uid.clone(),
            email: profile.email,
            display_name: profile.display_name,
            photo_url: profile.photo_url,
            created_at: stored.as_ref().and_then(|u| u.created_at),
            updated_at: stored.and_then(|u| u.updated_at),
        })
    }

    // === Habits ===

    pub fn log_habit(&self, claims: &IdentityClaims, new_log: NewHabitLog) -> Result<HabitLog> {
        new_log.validate()?;
        let now = self.now();
        let log = HabitLog {
            id: Uuid::new_v4().to_string(),
            uid: claims.uid.clone(),
            habit_type: new_log.habit_type,
            value: new_log.value,
            unit: new_log.resolved_unit(),
            timestamp: new_log.timestamp.unwrap_or(now),
            created_at: now,
        };
        self.db.insert_habit_log(&log)?;
        info!(uid = %log.uid, habit = %log.habit_type, id = %log.id, "habit logged");
        Ok(log)
    }

    pub fn habit_logs(&self, claims: &IdentityClaims, query: HabitLogQuery) -> Result<HabitLogPage> {
        query.validate(self.config.logs.max_days)?;
        let since = window_start(self.now(), query.days);
        let logs = self.db.habit_logs_since(&claims.uid, query.habit_type, since)?;
        Ok(HabitLogPage {
            total_count: logs.len(),
            logs,
            days_requested: query.days,
            habit_type: query.habit_type,
        })
    }

    pub fn streak(&self, claims: &IdentityClaims, habit_type: HabitType) -> Result<StreakReport> {
        let now = self.now();
        let streak = self.compute_streak(&claims.uid, habit_type, now)?;
        Ok(StreakReport {
            habit_type,
            streak,
            updated_at: now,
        })
    }

    fn compute_streak(&self, uid: &str, habit_type: HabitType, now: DateTime<Utc>) -> Result<StreakResult> {
        let since = window_start(now, self.config.streak.lookback_days);
        let timestamps = self.db.habit_timestamps_since(uid, habit_type, since)?;
        let dates = DateSet::from_timestamps(timestamps);
        let result = StreakCalculator::with_future_dates(self.config.streak.future_dates)
            .compute(&dates, now.date_naive());
        debug!(
            uid,
            habit = %habit_type,
            days = dates.len(),
            current = result.current_streak,
            best = result.best_streak,
            "computed streak"
        );
        Ok(result)
    }

    pub fn summary(&self, claims: &IdentityClaims, days: u32) -> Result<HabitSummary> {
        check_days("days", days, self.config.logs.summary_max_days)?;
        let now = self.now();
        let since = window_start(now, days);

        let mut summary = BTreeMap::new();
        for habit_type in HabitType::ALL {
            let logs = self.db.habit_logs_since(&claims.uid, Some(habit_type), since)?;
            let streak = self.compute_streak(&claims.uid, habit_type, now)?;
            summary.insert(
                habit_type,
                HabitSummaryEntry {
                    total_entries: logs.len(),
                    current_streak: streak.current_streak,
                    best_streak: streak.best_streak,
                    recent_logs: logs.into_iter().take(self.config.logs.recent_limit).collect(),
                },
            );
        }

        Ok(HabitSummary {
            summary,
            days_covered: days,
            user_id: claims.uid.clone(),
        })
    }

    // === Groups ===

    /// Create a group owned by the caller under a fresh join code.
    pub fn create_group(&self, claims: &IdentityClaims, new_group: NewGroup) -> Result<GroupView> {
        let name = new_group.validated_name()?.to_string();
        let now = self.now();
        let mut rng = rand::thread_rng();

        for attempt in 1..=self.config.groups.join_code_attempts {
            let join_code = generate_join_code(&mut rng);
            if self.db.join_code_exists(&join_code)? {
                debug!(attempt, "join code collision");
                continue;
            }

            let group = Group {
                id: Uuid::new_v4().to_string(),
                name: name.clone(),
                owner_id: claims.uid.clone(),
                join_code,
                created_at: now,
            };
            let owner = GroupMembership {
                group_id: group.id.clone(),
                user_id: claims.uid.clone(),
                role: GroupRole::Owner,
                joined_at: now,
            };

            match self.db.insert_group(&group, &owner) {
                Ok(()) => {
                    info!(group_id = %group.id, owner = %group.owner_id, "group created");
                    return Ok(GroupView {
                        group,
                        member_count: 1,
                    });
                }
                Err(CoreError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::Conflict(format!(
            "no free join code after {} attempts",
            self.config.groups.join_code_attempts
        )))
    }

    /// Join the group behind `join_code`. Existing members keep their role.
    pub fn join_group(&self, claims: &IdentityClaims, join_code: &str) -> Result<Group> {
        let code = normalize_join_code(join_code)?;
        let group = self
            .db
            .group_by_join_code(&code)?
            .ok_or_else(|| CoreError::NotFound {
                entity: "group with join code",
                id: code.clone(),
            })?;

        let membership = self.db.add_membership(&GroupMembership {
            group_id: group.id.clone(),
            user_id: claims.uid.clone(),
            role: GroupRole::Member,
            joined_at: self.now(),
        })?;
        info!(group_id = %group.id, uid = %claims.uid, role = %membership.role, "joined group");
        Ok(group)
    }

    pub fn my_groups(&self, claims: &IdentityClaims) -> Result<MyGroups> {
        let mut groups = Vec::new();
        for membership in self.db.memberships_for_user(&claims.uid)? {
            let Some(group) = self.db.get_group(&membership.group_id)? else {
                continue;
            };
            groups.push(MemberGroup {
                member_count: self.db.member_count(&group.id)?,
                group,
                my_role: membership.role,
            });
        }
        Ok(MyGroups {
            total_count: groups.len(),
            groups,
        })
    }

    /// Rank the members of a group the caller belongs to.
    pub fn leaderboard(&self, claims: &IdentityClaims, group_id: &str) -> Result<Leaderboard> {
        if self.db.get_membership(group_id, &claims.uid)?.is_none() {
            return Err(CoreError::Forbidden(
                "You are not a member of this group".into(),
            ));
        }
        let group = self.db.get_group(group_id)?.ok_or_else(|| CoreError::NotFound {
            entity: "group",
            id: group_id.to_string(),
        })?;

        let week_start = days_before(self.now(), self.config.leaderboard.window_days);

        let mut entries = Vec::new();
        for member in self.db.members_of(group_id)? {
            let display_name = self
                .db
                .get_user(&member.user_id)?
                .map(|u| u.display_name_or_anonymous().to_string())
                .unwrap_or_else(|| ANONYMOUS.to_string());
            let weekly_logs = self.db.count_logs_since(&member.user_id, week_start)?;
            entries.push(LeaderboardEntry::new(
                member.user_id,
                display_name,
                member.role,
                weekly_logs,
            ));
        }
        rank_entries(&mut entries);

        Ok(Leaderboard {
            group_id: group.id,
            group_name: group.name,
            total_members: entries.len(),
            entries,
            week_start,
        })
    }
}

//! Groups, memberships, join codes and leaderboards.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consistency::ConsistencyScore;
use crate::error::ValidationError;

/// Join code length.
pub const JOIN_CODE_LEN: usize = 6;

/// Symbols a join code is drawn from.
pub const JOIN_CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Maximum group name length (in characters).
pub const MAX_GROUP_NAME_LEN: usize = 50;

/// A member's role within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    Owner,
    Member,
}

impl GroupRole {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupRole::Owner => "owner",
            GroupRole::Member => "member",
        }
    }
}

impl fmt::Display for GroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(GroupRole::Owner),
            "member" => Ok(GroupRole::Member),
            other => Err(ValidationError::UnknownVariant {
                kind: "group role",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub join_code: String,
    pub created_at: DateTime<Utc>,
}

/// Membership of one user in one group. Unique per `(group_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: String,
    pub user_id: String,
    pub role: GroupRole,
    pub joined_at: DateTime<Utc>,
}

/// Group as returned to its creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupView {
    #[serde(flatten)]
    pub group: Group,
    pub member_count: u32,
}

/// Group as listed for one of its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberGroup {
    #[serde(flatten)]
    pub group: Group,
    pub member_count: u32,
    pub my_role: GroupRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MyGroups {
    pub groups: Vec<MemberGroup>,
    pub total_count: usize,
}

/// Request to create a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGroup {
    pub name: String,
}

impl NewGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Trimmed name, 1 to 50 characters.
    ///
    /// # Errors
    /// Returns an error when the trimmed name is empty or too long.
    pub fn validated_name(&self) -> Result<&str, ValidationError> {
        let name = self.name.trim();
        let len = name.chars().count();
        if len == 0 || len > MAX_GROUP_NAME_LEN {
            return Err(ValidationError::OutOfRange {
                field: "name length",
                min: 1,
                max: MAX_GROUP_NAME_LEN as i64,
                actual: len as i64,
            });
        }
        Ok(name)
    }
}

/// Draw a join code uniformly from [`JOIN_CODE_ALPHABET`].
pub fn generate_join_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..JOIN_CODE_LEN)
        .map(|_| JOIN_CODE_ALPHABET[rng.gen_range(0..JOIN_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Trim and uppercase user input, then check shape.
///
/// # Errors
/// Returns an error unless the result is exactly six alphabet symbols.
pub fn normalize_join_code(input: &str) -> Result<String, ValidationError> {
    let code = input.trim().to_ascii_uppercase();
    let valid = code.len() == JOIN_CODE_LEN && code.bytes().all(|b| JOIN_CODE_ALPHABET.contains(&b));
    if !valid {
        return Err(ValidationError::InvalidValue {
            field: "join_code",
            message: format!("expected {JOIN_CODE_LEN} letters or digits, got '{}'", input.trim()),
        });
    }
    Ok(code)
}

/// One ranked row of a group leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: String,
    pub role: GroupRole,
    pub consistency_score: ConsistencyScore,
    pub weekly_logs: u32,
}

impl LeaderboardEntry {
    pub fn new(user_id: String, display_name: String, role: GroupRole, weekly_logs: u32) -> Self {
        Self {
            user_id,
            display_name,
            role,
            consistency_score: ConsistencyScore::from_weekly_count(weekly_logs),
            weekly_logs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub group_id: String,
    pub group_name: String,
    pub entries: Vec<LeaderboardEntry>,
    pub week_start: DateTime<Utc>,
    pub total_members: usize,
}

/// Sort by score, then raw log count, both descending; user id breaks ties.
pub fn rank_entries(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| {
        b.consistency_score
            .partial_cmp(&a.consistency_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.weekly_logs.cmp(&a.weekly_logs))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn join_code_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let code = generate_join_code(&mut rng);
            assert_eq!(code.len(), JOIN_CODE_LEN);
            assert!(code.bytes().all(|b| JOIN_CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn join_code_uses_whole_alphabet() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.extend(generate_join_code(&mut rng).into_bytes());
        }
        assert_eq!(seen.len(), JOIN_CODE_ALPHABET.len());
    }

    #[test]
    fn normalize_accepts_lowercase_and_padding() {
        assert_eq!(normalize_join_code(" ab12cd ").unwrap(), "AB12CD");
    }

    #[test]
    fn normalize_rejects_bad_codes() {
        assert!(normalize_join_code("ABC").is_err());
        assert!(normalize_join_code("ABCDEFG").is_err());
        assert!(normalize_join_code("AB-12C").is_err());
        assert!(normalize_join_code("").is_err());
    }

    #[test]
    fn group_name_bounds() {
        assert_eq!(NewGroup::new("  Night Owls ").validated_name().unwrap(), "Night Owls");
        assert!(NewGroup::new("   ").validated_name().is_err());
        assert!(NewGroup::new("x".repeat(51)).validated_name().is_err());
        assert!(NewGroup::new("x".repeat(50)).validated_name().is_ok());
    }

    #[test]
    fn role_string_roundtrip() {
        assert_eq!("owner".parse::<GroupRole>().unwrap(), GroupRole::Owner);
        assert_eq!(GroupRole::Member.as_str(), "member");
        assert!("admin".parse::<GroupRole>().is_err());
    }

    #[test]
    fn ranking_orders_by_score_then_logs() {
        let mut entries = vec![
            LeaderboardEntry::new("a".into(), "A".into(), GroupRole::Member, 2),
            LeaderboardEntry::new("b".into(), "B".into(), GroupRole::Owner, 9),
            LeaderboardEntry::new("c".into(), "C".into(), GroupRole::Member, 12),
            LeaderboardEntry::new("d".into(), "D".into(), GroupRole::Member, 5),
        ];
        rank_entries(&mut entries);
        let order: Vec<_> = entries.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "d", "a"]);
        assert_eq!(entries[0].consistency_score.value(), 100.0);
        assert_eq!(entries[1].consistency_score.value(), 100.0);
    }
}

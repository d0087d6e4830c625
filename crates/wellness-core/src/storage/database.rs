//! SQLite-based document storage.
//!
//! Provides persistent storage for:
//! - User profiles
//! - Habit log entries
//! - Groups and their memberships
//!
//! The handle is opened explicitly by the caller and handed to whatever needs
//! it; [`Database::close`] ends its lifecycle. Timestamps are stored as
//! fixed-width RFC 3339 UTC strings so that string comparison in SQL orders
//! them chronologically.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::debug;

use super::{data_dir, migrations};
use crate::error::{CoreError, DatabaseError, Result};
use crate::group::{Group, GroupMembership};
use crate::habit::{HabitLog, HabitType};
use crate::user::{User, UserProfile};

/// Database file name inside the data directory.
pub const DB_FILE: &str = "wellness.db";

/// Format a timestamp for storage and range comparison.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn get_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn get_parsed<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        uid: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        photo_url: row.get(3)?,
        created_at: Some(get_timestamp(row, 4)?),
        updated_at: Some(get_timestamp(row, 5)?),
    })
}

fn row_to_habit_log(row: &Row) -> rusqlite::Result<HabitLog> {
    Ok(HabitLog {
        id: row.get(0)?,
        uid: row.get(1)?,
        habit_type: get_parsed(row, 2)?,
        value: row.get(3)?,
        unit: row.get(4)?,
        timestamp: get_timestamp(row, 5)?,
        created_at: get_timestamp(row, 6)?,
    })
}

fn row_to_group(row: &Row) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        name: row.get(1)?,
        owner_id: row.get(2)?,
        join_code: row.get(3)?,
        created_at: get_timestamp(row, 4)?,
    })
}

fn row_to_membership(row: &Row) -> rusqlite::Result<GroupMembership> {
    Ok(GroupMembership {
        group_id: row.get(0)?,
        user_id: row.get(1)?,
        role: get_parsed(row, 2)?,
        joined_at: get_timestamp(row, 3)?,
    })
}

const USER_COLUMNS: &str = "uid, email, display_name, photo_url, created_at, updated_at";
const LOG_COLUMNS: &str = "id, uid, habit_type, value, unit, timestamp, created_at";
const GROUP_COLUMNS: &str = "id, name, owner_id, join_code, created_at";
const MEMBER_COLUMNS: &str = "group_id, user_id, role, joined_at";

/// SQLite database handle.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/wellness.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory, the file, or the migration fails.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join(DB_FILE))
    }

    /// Open (or create) the database at `path` and migrate it.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened database");
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Close the connection, flushing pending work.
    ///
    /// # Errors
    /// Returns an error if SQLite refuses to close the handle.
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_conn, e)| CoreError::Database(e.into()))
    }

    // === Users ===

    /// Insert or refresh a user. `created_at` is only written for new users.
    pub fn upsert_user(&self, uid: &str, profile: &UserProfile, now: DateTime<Utc>) -> Result<User> {
        let now = format_timestamp(now);
        self.conn.execute(
            "INSERT INTO users (uid, email, display_name, photo_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(uid) DO UPDATE SET
                email = excluded.email,
                display_name = excluded.display_name,
                photo_url = excluded.photo_url,
                updated_at = excluded.updated_at",
            params![uid, profile.email, profile.display_name, profile.photo_url, now],
        )?;
        self.get_user(uid)?.ok_or_else(|| CoreError::NotFound {
            entity: "user",
            id: uid.to_string(),
        })
    }

    pub fn get_user(&self, uid: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE uid = ?1"),
                params![uid],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    // === Habit logs ===

    pub fn insert_habit_log(&self, log: &HabitLog) -> Result<()> {
        self.conn.execute(
            "INSERT INTO habit_logs (id, uid, habit_type, value, unit, timestamp, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                log.id,
                log.uid,
                log.habit_type.as_str(),
                log.value,
                log.unit,
                format_timestamp(log.timestamp),
                format_timestamp(log.created_at),
            ],
        )?;
        Ok(())
    }

    /// Logs at or after `since`, newest first, optionally for one habit.
    pub fn habit_logs_since(
        &self,
        uid: &str,
        habit_type: Option<HabitType>,
        since: DateTime<Utc>,
    ) -> Result<Vec<HabitLog>> {
        let since = format_timestamp(since);
        let logs = match habit_type {
            Some(habit) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {LOG_COLUMNS} FROM habit_logs
                     WHERE uid = ?1 AND habit_type = ?2 AND timestamp >= ?3
                     ORDER BY timestamp DESC"
                ))?;
                let rows = stmt.query_map(params![uid, habit.as_str(), since], row_to_habit_log)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {LOG_COLUMNS} FROM habit_logs
                     WHERE uid = ?1 AND timestamp >= ?2
                     ORDER BY timestamp DESC"
                ))?;
                let rows = stmt.query_map(params![uid, since], row_to_habit_log)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(logs)
    }

    /// Timestamps of one habit's logs at or after `since`, oldest first.
    pub fn habit_timestamps_since(
        &self,
        uid: &str,
        habit_type: HabitType,
        since: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp FROM habit_logs
             WHERE uid = ?1 AND habit_type = ?2 AND timestamp >= ?3
             ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map(
            params![uid, habit_type.as_str(), format_timestamp(since)],
            |row| get_timestamp(row, 0),
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Number of logs of any habit at or after `since`.
    pub fn count_logs_since(&self, uid: &str, since: DateTime<Utc>) -> Result<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM habit_logs WHERE uid = ?1 AND timestamp >= ?2",
            params![uid, format_timestamp(since)],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(count)
    }

    // === Groups ===

    /// Insert a group together with its owner's membership.
    ///
    /// # Errors
    /// Returns [`CoreError::Conflict`] if the join code is already taken.
    pub fn insert_group(&self, group: &Group, owner: &GroupMembership) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let inserted = tx.execute(
            "INSERT INTO groups (id, name, owner_id, join_code, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                group.id,
                group.name,
                group.owner_id,
                group.join_code,
                format_timestamp(group.created_at),
            ],
        );
        if let Err(rusqlite::Error::SqliteFailure(e, _)) = &inserted {
            if e.code == ErrorCode::ConstraintViolation {
                return Err(CoreError::Conflict(format!(
                    "join code {} already in use",
                    group.join_code
                )));
            }
        }
        inserted?;
        tx.execute(
            "INSERT INTO group_members (group_id, user_id, role, joined_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                owner.group_id,
                owner.user_id,
                owner.role.as_str(),
                format_timestamp(owner.joined_at),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_group(&self, id: &str) -> Result<Option<Group>> {
        let group = self
            .conn
            .query_row(
                &format!("SELECT {GROUP_COLUMNS} FROM groups WHERE id = ?1"),
                params![id],
                row_to_group,
            )
            .optional()?;
        Ok(group)
    }

    pub fn group_by_join_code(&self, join_code: &str) -> Result<Option<Group>> {
        let group = self
            .conn
            .query_row(
                &format!("SELECT {GROUP_COLUMNS} FROM groups WHERE join_code = ?1 LIMIT 1"),
                params![join_code],
                row_to_group,
            )
            .optional()?;
        Ok(group)
    }

    pub fn join_code_exists(&self, join_code: &str) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM groups WHERE join_code = ?1)",
            params![join_code],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(exists)
    }

    // === Memberships ===

    /// Add a membership unless one exists; returns the stored membership.
    pub fn add_membership(&self, membership: &GroupMembership) -> Result<GroupMembership> {
        self.conn.execute(
            "INSERT INTO group_members (group_id, user_id, role, joined_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(group_id, user_id) DO NOTHING",
            params![
                membership.group_id,
                membership.user_id,
                membership.role.as_str(),
                format_timestamp(membership.joined_at),
            ],
        )?;
        self.get_membership(&membership.group_id, &membership.user_id)?
            .ok_or_else(|| CoreError::NotFound {
                entity: "membership",
                id: format!("{}_{}", membership.group_id, membership.user_id),
            })
    }

    pub fn get_membership(&self, group_id: &str, user_id: &str) -> Result<Option<GroupMembership>> {
        let membership = self
            .conn
            .query_row(
                &format!(
                    "SELECT {MEMBER_COLUMNS} FROM group_members WHERE group_id = ?1 AND user_id = ?2"
                ),
                params![group_id, user_id],
                row_to_membership,
            )
            .optional()?;
        Ok(membership)
    }

    /// Memberships of one user, oldest first.
    pub fn memberships_for_user(&self, user_id: &str) -> Result<Vec<GroupMembership>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM group_members WHERE user_id = ?1 ORDER BY joined_at ASC"
        ))?;
        let rows = stmt.query_map(params![user_id], row_to_membership)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Members of one group, oldest first.
    pub fn members_of(&self, group_id: &str) -> Result<Vec<GroupMembership>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM group_members WHERE group_id = ?1 ORDER BY joined_at ASC"
        ))?;
        let rows = stmt.query_map(params![group_id], row_to_membership)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn member_count(&self, group_id: &str) -> Result<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM group_members WHERE group_id = ?1",
            params![group_id],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(count)
    }
}

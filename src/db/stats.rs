//! User gamification stats with compare-and-swap updates

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::domain::UserStats;

pub fn get_user_stats(conn: &Connection, user_id: &str) -> Result<Option<UserStats>> {
    conn.query_row(
        r#"
    SELECT user_id, level, xp, total_questions_answered, streak_days, last_activity_date, version
    FROM user_stats WHERE user_id = ?1
    "#,
        params![user_id],
        row_to_stats,
    )
    .optional()
}

/// Create the default row for a user (level 1, no XP) and return what is
/// stored. A concurrent creator wins silently.
pub fn create_default_user_stats(conn: &Connection, user_id: &str) -> Result<UserStats> {
    let defaults = UserStats::new(user_id);
    conn.execute(
        r#"
    INSERT OR IGNORE INTO user_stats
      (user_id, level, xp, total_questions_answered, streak_days, last_activity_date, version, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, NULL, 0, ?6)
    "#,
        params![
            user_id,
            defaults.level,
            defaults.xp,
            defaults.total_questions_answered,
            defaults.streak_days,
            Utc::now().to_rfc3339(),
        ],
    )?;
    get_user_stats(conn, user_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

/// Write `stats` only if the stored version still equals `stats.version`.
/// On success the stored version is bumped by one. Returns whether the row
/// was written; false means another writer got there first.
pub fn update_user_stats(conn: &Connection, stats: &UserStats) -> Result<bool> {
    let updated = conn.execute(
        r#"
    UPDATE user_stats
    SET level = ?2, xp = ?3, total_questions_answered = ?4, streak_days = ?5,
        last_activity_date = ?6, version = version + 1
    WHERE user_id = ?1 AND version = ?7
    "#,
        params![
            stats.user_id,
            stats.level,
            stats.xp,
            stats.total_questions_answered,
            stats.streak_days,
            stats.last_activity_date.map(|d| d.to_string()),
            stats.version,
        ],
    )?;
    Ok(updated > 0)
}

fn row_to_stats(row: &rusqlite::Row) -> Result<UserStats> {
    let last_activity: Option<String> = row.get(5)?;
    Ok(UserStats {
        user_id: row.get(0)?,
        level: row.get(1)?,
        xp: row.get(2)?,
        total_questions_answered: row.get(3)?,
        streak_days: row.get(4)?,
        last_activity_date: last_activity
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
        version: row.get(6)?,
    })
}

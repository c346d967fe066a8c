//! Users, roles and auth sessions.
//!
//! Identity is established elsewhere; this module only stores who a session
//! token belongs to and which roles a user holds.

use chrono::{Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};
use uuid::Uuid;

pub const ADMIN_ROLE: &str = "admin";

/// Create a new user, returns the user ID
pub fn create_user(conn: &Connection, email: &str, full_name: Option<&str>) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO users (id, email, full_name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![id, email.trim(), full_name, Utc::now().to_rfc3339()],
    )?;
    Ok(id)
}

/// Grant a role (idempotent)
pub fn add_role(conn: &Connection, user_id: &str, role: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?1, ?2)",
        params![user_id, role],
    )?;
    Ok(())
}

pub fn has_role(conn: &Connection, user_id: &str, role: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM user_roles WHERE user_id = ?1 AND role = ?2",
        params![user_id, role],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Create a new session for a user and return its token
pub fn create_session(conn: &Connection, user_id: &str, duration_hours: i64) -> Result<String> {
    let token = super::generate_session_token();
    let now = Utc::now();
    let expires = now + Duration::hours(duration_hours);
    conn.execute(
        "INSERT INTO auth_sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![token, user_id, now.to_rfc3339(), expires.to_rfc3339()],
    )?;
    Ok(token)
}

/// Validate a session token and return its user id. Expired sessions are
/// treated as absent.
pub fn get_session_user(conn: &Connection, token: &str) -> Result<Option<String>> {
    let now = Utc::now().to_rfc3339();
    conn.query_row(
        r#"
        SELECT s.user_id
        FROM auth_sessions s
        JOIN users u ON s.user_id = u.id
        WHERE s.token = ?1 AND s.expires_at > ?2
    "#,
        params![token, now],
        |row| row.get(0),
    )
    .optional()
}

/// Cleanup expired sessions, returns count of deleted sessions
pub fn cleanup_expired_sessions(conn: &Connection) -> Result<usize> {
    let now = Utc::now().to_rfc3339();
    let count = conn.execute("DELETE FROM auth_sessions WHERE expires_at < ?1", params![now])?;
    Ok(count)
}

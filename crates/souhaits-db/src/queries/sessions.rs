//! Session query functions.

use rusqlite::{Connection, OptionalExtension};
use souhaits_types::{Timestamp, User, UserId};

use crate::Result;

/// Insert a new session owned by `user`.
pub fn insert(conn: &Connection, token: &str, user: UserId, now: Timestamp) -> Result<()> {
    conn.execute(
        "INSERT INTO session (token, user_id, created_at, activity_at)
         VALUES (?1, ?2, ?3, ?3)",
        rusqlite::params![token, user, now as i64],
    )?;
    Ok(())
}

/// The user a session token belongs to.
pub fn user_for(conn: &Connection, token: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT u.id, u.email FROM user u JOIN session s ON s.user_id = u.id
             WHERE s.token = ?1",
            [token],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    email: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

/// Slide the session's activity time forward.
pub fn touch(conn: &Connection, token: &str, now: Timestamp) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE session SET activity_at = ?1 WHERE token = ?2",
        rusqlite::params![now as i64, token],
    )?;
    Ok(updated > 0)
}

/// Hand a session over to another user.
pub fn reassign(conn: &Connection, token: &str, user: UserId) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE session SET user_id = ?1 WHERE token = ?2",
        rusqlite::params![user, token],
    )?;
    Ok(updated > 0)
}

/// Last activity time of a session.
pub fn activity_at(conn: &Connection, token: &str) -> Result<Option<Timestamp>> {
    let at = conn
        .query_row(
            "SELECT activity_at FROM session WHERE token = ?1",
            [token],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(at.map(|t| t as Timestamp))
}

/// Delete a session.
pub fn delete(conn: &Connection, token: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM session WHERE token = ?1", [token])?;
    Ok(deleted > 0)
}

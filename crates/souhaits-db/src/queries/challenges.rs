//! Challenge query functions.
//!
//! A challenge binds a claimed email to a user. It starts inactive and is
//! activated the first time someone follows its link; active challenges
//! double as reusable login links.

use rusqlite::{Connection, OptionalExtension};
use souhaits_types::{Timestamp, UserId};

use crate::Result;

/// Insert a new, inactive challenge.
pub fn insert(
    conn: &Connection,
    token: &str,
    email: &str,
    user: UserId,
    now: Timestamp,
) -> Result<()> {
    conn.execute(
        "INSERT INTO challenge (token, email, user_id, active, created_at)
         VALUES (?1, ?2, ?3, 0, ?4)",
        rusqlite::params![token, email, user, now as i64],
    )?;
    Ok(())
}

/// Get a challenge by token.
pub fn get(conn: &Connection, token: &str) -> Result<Option<ChallengeRow>> {
    let row = conn
        .query_row(
            "SELECT token, email, user_id, active, created_at FROM challenge WHERE token = ?1",
            [token],
            |row| {
                Ok(ChallengeRow {
                    token: row.get(0)?,
                    email: row.get(1)?,
                    user: row.get(2)?,
                    active: row.get(3)?,
                    created_at: row.get::<_, i64>(4)? as Timestamp,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Drop the active challenges for an email.
pub fn delete_active_for_email(conn: &Connection, email: &str) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM challenge WHERE email = ?1 AND active = 1",
        [email],
    )?;
    Ok(deleted)
}

/// Mark a challenge as answered.
pub fn activate(conn: &Connection, token: &str) -> Result<bool> {
    let updated = conn.execute("UPDATE challenge SET active = 1 WHERE token = ?1", [token])?;
    Ok(updated > 0)
}

/// Hand a challenge over to another user.
pub fn reassign(conn: &Connection, token: &str, user: UserId) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE challenge SET user_id = ?1 WHERE token = ?2",
        rusqlite::params![user, token],
    )?;
    Ok(updated > 0)
}

/// Most recent email a user has claimed.
pub fn claimed_email(conn: &Connection, user: UserId) -> Result<Option<String>> {
    let email = conn
        .query_row(
            "SELECT email FROM challenge WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
            [user],
            |row| row.get(0),
        )
        .optional()?;
    Ok(email)
}

/// Token of the active challenge for an email, usable as a login link.
pub fn active_token_for_email(conn: &Connection, email: &str) -> Result<Option<String>> {
    let token = conn
        .query_row(
            "SELECT token FROM challenge WHERE email = ?1 AND active = 1
             ORDER BY created_at DESC LIMIT 1",
            [email],
            |row| row.get(0),
        )
        .optional()?;
    Ok(token)
}

/// A raw challenge row from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRow {
    pub token: String,
    pub email: String,
    pub user: UserId,
    pub active: bool,
    pub created_at: Timestamp,
}

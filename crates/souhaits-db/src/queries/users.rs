//! User query functions.

use rusqlite::{Connection, OptionalExtension};
use souhaits_types::{Timestamp, User, UserId};

use crate::{DbError, Result};

/// Insert a fresh, unverified user.
pub fn insert_anonymous(conn: &Connection, created_at: Timestamp) -> Result<UserId> {
    conn.execute(
        "INSERT INTO user (created_at, email) VALUES (?1, NULL)",
        [created_at as i64],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get a user by id.
pub fn get(conn: &Connection, id: UserId) -> Result<User> {
    find(conn, id)?.ok_or_else(|| DbError::NotFound(format!("user {id}")))
}

/// Get a user by id, if it still exists.
pub fn find(conn: &Connection, id: UserId) -> Result<Option<User>> {
    let user = conn
        .query_row("SELECT id, email FROM user WHERE id = ?1", [id], |row| {
            Ok(User {
                id: row.get(0)?,
                email: row.get(1)?,
            })
        })
        .optional()?;
    Ok(user)
}

/// Get the verified user owning `email`. The address must already be
/// lowercase.
pub fn by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, email FROM user WHERE email = ?1",
            [email],
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

/// Mark a user as verified.
pub fn set_email(conn: &Connection, id: UserId, email: &str) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE user SET email = ?1 WHERE id = ?2",
            rusqlite::params![email, id],
        )
        .map_err(|e| {
            if crate::is_unique_violation(&e) {
                DbError::Constraint(format!("email {email} already taken"))
            } else {
                DbError::Sqlite(e)
            }
        })?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("user {id}")));
    }
    Ok(())
}

/// Delete a user and, through the cascades, everything it owns.
pub fn delete(conn: &Connection, id: UserId) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM user WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

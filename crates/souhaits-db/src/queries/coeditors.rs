//! Co-editor query functions.

use rusqlite::Connection;
use souhaits_types::{User, UserId, WishlistId};

use crate::{is_unique_violation, DbError, Result};

/// Grant edit rights on `list` to `user`.
pub fn insert(conn: &Connection, list: WishlistId, user: UserId) -> Result<()> {
    conn.execute(
        "INSERT INTO coeditor (list, user_id) VALUES (?1, ?2)",
        rusqlite::params![list, user],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            DbError::Constraint(format!("user {user} already co-edits list {list}"))
        } else {
            DbError::Sqlite(e)
        }
    })?;
    Ok(())
}

/// Revoke every co-editor of a list.
pub fn clear(conn: &Connection, list: WishlistId) -> Result<usize> {
    let deleted = conn.execute("DELETE FROM coeditor WHERE list = ?1", [list])?;
    Ok(deleted)
}

/// Revoke one co-editor.
pub fn remove(conn: &Connection, list: WishlistId, user: UserId) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM coeditor WHERE list = ?1 AND user_id = ?2",
        rusqlite::params![list, user],
    )?;
    Ok(deleted > 0)
}

/// True if `user` co-edits `list`.
pub fn contains(conn: &Connection, list: WishlistId, user: UserId) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM coeditor WHERE list = ?1 AND user_id = ?2",
        rusqlite::params![list, user],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Users co-editing a list.
pub fn users_for(conn: &Connection, list: WishlistId) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.email FROM user u JOIN coeditor c ON c.user_id = u.id
         WHERE c.list = ?1 ORDER BY u.email",
    )?;
    let rows = stmt
        .query_map([list], |row| {
            Ok(User {
                id: row.get(0)?,
                email: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

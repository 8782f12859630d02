//! Follow ("friend") query functions.

use rusqlite::Connection;
use souhaits_types::{FollowedList, Timestamp, UserId, WishlistId};

use crate::queries::wishlists;
use crate::Result;

/// Record a visit: refresh the follow's visit time, or start following.
pub fn visit(conn: &Connection, list: WishlistId, user: UserId, now: Timestamp) -> Result<()> {
    conn.execute(
        "INSERT INTO friend (list, user_id, visit_at) VALUES (?1, ?2, ?3)
         ON CONFLICT (list, user_id) DO UPDATE SET visit_at = excluded.visit_at",
        rusqlite::params![list, user, now as i64],
    )?;
    Ok(())
}

/// Start following without touching an existing visit time.
pub fn insert_if_missing(
    conn: &Connection,
    list: WishlistId,
    user: UserId,
    now: Timestamp,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO friend (list, user_id, visit_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![list, user, now as i64],
    )?;
    Ok(inserted > 0)
}

/// Stop following a list.
pub fn remove(conn: &Connection, list: WishlistId, user: UserId) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM friend WHERE list = ?1 AND user_id = ?2",
        rusqlite::params![list, user],
    )?;
    Ok(deleted > 0)
}

/// Copy `from`'s follows to `to`, skipping lists `to` already follows.
pub fn merge_into(conn: &Connection, from: UserId, to: UserId) -> Result<usize> {
    let copied = conn.execute(
        "INSERT OR IGNORE INTO friend (list, user_id, visit_at)
         SELECT list, ?2, visit_at FROM friend WHERE user_id = ?1",
        rusqlite::params![from, to],
    )?;
    Ok(copied)
}

/// Drop follows of lists the user owns.
pub fn remove_own_lists(conn: &Connection, user: UserId) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM friend WHERE user_id = ?1
         AND list IN (SELECT id FROM wishlist WHERE owner = ?1)",
        [user],
    )?;
    Ok(deleted)
}

/// Lists followed by a user, flagged when modified after the last visit.
pub fn followed_by(conn: &Connection, user: UserId) -> Result<Vec<FollowedList>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT w.modified_at > f.visit_at, {cols}
         FROM friend f JOIN wishlist w ON w.id = f.list
         WHERE f.user_id = ?1
         ORDER BY w.name",
        cols = wishlists::COLUMNS
    ))?;
    let rows = stmt
        .query_map([user], |row| {
            Ok(FollowedList {
                has_news: row.get(0)?,
                list: wishlists::from_row(row, 1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

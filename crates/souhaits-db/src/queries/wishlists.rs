//! Wishlist query functions.

use rusqlite::{Connection, OptionalExtension, Row};
use souhaits_types::{Timestamp, UserId, Wishlist, WishlistId};

use crate::{DbError, Result};

/// Columns selected by every wishlist query, in [`from_row`] order.
pub(crate) const COLUMNS: &str =
    "w.id, w.url, w.name, w.description, w.owner, w.show_reservations, w.theme";

/// Map a row starting at column `offset` onto a [`Wishlist`].
pub(crate) fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Wishlist> {
    Ok(Wishlist {
        id: row.get(offset)?,
        url: row.get(offset + 1)?,
        name: row.get(offset + 2)?,
        description: row.get(offset + 3)?,
        owner: row.get(offset + 4)?,
        show_reservations: row.get(offset + 5)?,
        theme: row.get(offset + 6)?,
    })
}

/// Insert a new wishlist. Fails with a uniqueness violation if `url` is
/// taken.
pub fn insert(
    conn: &Connection,
    url: &str,
    name: &str,
    owner: UserId,
    now: Timestamp,
) -> Result<WishlistId> {
    conn.execute(
        "INSERT INTO wishlist (url, name, owner, created_at, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        rusqlite::params![url, name, owner, now as i64],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get a wishlist by id.
pub fn get(conn: &Connection, id: WishlistId) -> Result<Wishlist> {
    find(conn, id)?.ok_or_else(|| DbError::NotFound(format!("wishlist {id}")))
}

/// Get a wishlist by id, if it exists.
pub fn find(conn: &Connection, id: WishlistId) -> Result<Option<Wishlist>> {
    let list = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM wishlist w WHERE w.id = ?1"),
            [id],
            |row| from_row(row, 0),
        )
        .optional()?;
    Ok(list)
}

/// Get a wishlist by its URL fragment.
pub fn by_url(conn: &Connection, url: &str) -> Result<Option<Wishlist>> {
    let list = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM wishlist w WHERE w.url = ?1"),
            [url],
            |row| from_row(row, 0),
        )
        .optional()?;
    Ok(list)
}

/// List the wishlists owned by a user.
pub fn owned_by(conn: &Connection, owner: UserId) -> Result<Vec<Wishlist>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM wishlist w WHERE w.owner = ?1 ORDER BY w.created_at, w.id"
    ))?;
    let rows = stmt
        .query_map([owner], |row| from_row(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Rename a wishlist.
pub fn set_name(conn: &Connection, id: WishlistId, name: &str) -> Result<()> {
    conn.execute(
        "UPDATE wishlist SET name = ?1 WHERE id = ?2",
        rusqlite::params![name, id],
    )?;
    Ok(())
}

/// Change the URL fragment. Fails with a uniqueness violation if taken by
/// another list.
pub fn set_url(conn: &Connection, id: WishlistId, url: &str) -> Result<()> {
    conn.execute(
        "UPDATE wishlist SET url = ?1 WHERE id = ?2",
        rusqlite::params![url, id],
    )?;
    Ok(())
}

pub fn set_description(conn: &Connection, id: WishlistId, description: &str) -> Result<()> {
    conn.execute(
        "UPDATE wishlist SET description = ?1 WHERE id = ?2",
        rusqlite::params![description, id],
    )?;
    Ok(())
}

pub fn set_show_reservations(conn: &Connection, id: WishlistId, show: bool) -> Result<()> {
    conn.execute(
        "UPDATE wishlist SET show_reservations = ?1 WHERE id = ?2",
        rusqlite::params![show, id],
    )?;
    Ok(())
}

pub fn set_theme(conn: &Connection, id: WishlistId, theme: &str) -> Result<()> {
    conn.execute(
        "UPDATE wishlist SET theme = ?1 WHERE id = ?2",
        rusqlite::params![theme, id],
    )?;
    Ok(())
}

/// Bump the modification time.
pub fn touch(conn: &Connection, id: WishlistId, now: Timestamp) -> Result<()> {
    conn.execute(
        "UPDATE wishlist SET modified_at = ?1 WHERE id = ?2",
        rusqlite::params![now as i64, id],
    )?;
    Ok(())
}

/// Modification time of a wishlist.
pub fn modified_at(conn: &Connection, id: WishlistId) -> Result<Timestamp> {
    let at: i64 = conn
        .query_row(
            "SELECT modified_at FROM wishlist WHERE id = ?1",
            [id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| DbError::NotFound(format!("wishlist {id}")))?;
    Ok(at as Timestamp)
}

/// Move every wishlist of `from` to `to`.
pub fn transfer_owner(conn: &Connection, from: UserId, to: UserId) -> Result<usize> {
    let moved = conn.execute(
        "UPDATE wishlist SET owner = ?1 WHERE owner = ?2",
        rusqlite::params![to, from],
    )?;
    Ok(moved)
}

/// Delete a wishlist; items, follows and co-editors go with it.
pub fn delete(conn: &Connection, id: WishlistId) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM wishlist WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

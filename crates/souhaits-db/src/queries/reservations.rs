//! Reservation query functions.
//!
//! `reservation.item` is UNIQUE: the store, not the caller, decides who wins
//! when two people reserve the same item.

use rusqlite::{Connection, OptionalExtension, Row};
use souhaits_types::{Holder, Item, ItemId, ReservationStatus, Timestamp, UserId, WishlistId};

use crate::queries::items;
use crate::{is_unique_violation, DbError, Result};

/// Map `item, owner, email, status, confirmed_at` starting at `offset`.
pub(crate) fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<ReservationRow> {
    let code: String = row.get(offset + 3)?;
    let status = ReservationStatus::from_code(&code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            offset + 3,
            rusqlite::types::Type::Text,
            format!("unknown reservation status {code:?}").into(),
        )
    })?;
    Ok(ReservationRow {
        item: row.get(offset)?,
        holder: Holder {
            id: row.get(offset + 1)?,
            email: row.get(offset + 2)?,
        },
        status,
        confirmed_at: row.get::<_, Option<i64>>(offset + 4)?.map(|t| t as Timestamp),
    })
}

/// Reserve an item. Returns `false` if it already carries a reservation.
pub fn insert(conn: &Connection, item: ItemId, holder: UserId, now: Timestamp) -> Result<bool> {
    let result = conn.execute(
        "INSERT INTO reservation (item, owner, status, created_at) VALUES (?1, ?2, 'R', ?3)",
        rusqlite::params![item, holder, now as i64],
    );
    match result {
        Ok(_) => Ok(true),
        Err(e) if is_unique_violation(&e) => Ok(false),
        Err(e) => Err(DbError::Sqlite(e)),
    }
}

/// Current reservation of an item, whatever its status.
pub fn get(conn: &Connection, item: ItemId) -> Result<Option<ReservationRow>> {
    let row = conn
        .query_row(
            "SELECT r.item, r.owner, u.email, r.status, r.confirmed_at
             FROM reservation r JOIN user u ON u.id = r.owner
             WHERE r.item = ?1",
            [item],
            |row| from_row(row, 0),
        )
        .optional()?;
    Ok(row)
}

/// True if the item carries a Reserved (not Donated) reservation.
pub fn is_reserved(conn: &Connection, item: ItemId) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM reservation WHERE item = ?1 AND status = 'R'",
        [item],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Drop `holder`'s Reserved reservation on `item`.
pub fn release(conn: &Connection, item: ItemId, holder: UserId) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM reservation WHERE item = ?1 AND owner = ?2 AND status = 'R'",
        rusqlite::params![item, holder],
    )?;
    Ok(deleted > 0)
}

/// Move `holder`'s Reserved reservation on `item` to Donated. Returns
/// `false` when there was nothing to transition.
pub fn mark_donated(conn: &Connection, item: ItemId, holder: UserId, now: Timestamp) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE reservation SET status = 'D', confirmed_at = ?1
         WHERE item = ?2 AND owner = ?3 AND status = 'R'",
        rusqlite::params![now as i64, item, holder],
    )?;
    Ok(updated > 0)
}

/// Drop a Donated reservation, putting the wish back on its list.
pub fn clear_donated(conn: &Connection, item: ItemId) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM reservation WHERE item = ?1 AND status = 'D'",
        [item],
    )?;
    Ok(deleted > 0)
}

/// Move every reservation held by `from` to `to`.
pub fn transfer_holder(conn: &Connection, from: UserId, to: UserId) -> Result<usize> {
    let moved = conn.execute(
        "UPDATE reservation SET owner = ?1 WHERE owner = ?2",
        rusqlite::params![to, from],
    )?;
    Ok(moved)
}

/// Delete the reservations `user` holds on items of its own wishlists.
pub fn delete_self_reservations(conn: &Connection, user: UserId) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM reservation WHERE owner = ?1 AND item IN (
             SELECT i.id FROM item i JOIN wishlist w ON w.id = i.list WHERE w.owner = ?1
         )",
        [user],
    )?;
    Ok(deleted)
}

/// Reserved (not Donated) reservations on a list's items.
pub fn reserved_in_list(conn: &Connection, list: WishlistId) -> Result<Vec<ReservationRow>> {
    let mut stmt = conn.prepare(
        "SELECT r.item, r.owner, u.email, r.status, r.confirmed_at
         FROM reservation r
         JOIN item i ON i.id = r.item
         JOIN user u ON u.id = r.owner
         WHERE i.list = ?1 AND r.status = 'R'",
    )?;
    let rows = stmt
        .query_map([list], |row| from_row(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Reserved titles on a list, one entry per (holder, item).
pub fn reserved_titles_in_list(
    conn: &Connection,
    list: WishlistId,
) -> Result<Vec<(Holder, String)>> {
    let mut stmt = conn.prepare(
        "SELECT r.owner, u.email, i.title
         FROM reservation r
         JOIN item i ON i.id = r.item
         JOIN user u ON u.id = r.owner
         WHERE i.list = ?1 AND r.status = 'R'
         ORDER BY r.owner, i.title",
    )?;
    let rows = stmt
        .query_map([list], |row| {
            Ok((
                Holder {
                    id: row.get(0)?,
                    email: row.get(1)?,
                },
                row.get(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Items `user` currently holds as Reserved.
pub fn held_by(conn: &Connection, user: UserId) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(
        "SELECT i.id, i.list, i.title, i.description, i.link, i.score
         FROM item i JOIN reservation r ON r.item = i.id
         WHERE r.owner = ?1 AND r.status = 'R'
         ORDER BY i.list, i.score DESC",
    )?;
    let rows = stmt
        .query_map([user], |row| items::from_row(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// A reservation joined with its holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRow {
    pub item: ItemId,
    pub holder: Holder,
    pub status: ReservationStatus,
    pub confirmed_at: Option<Timestamp>,
}

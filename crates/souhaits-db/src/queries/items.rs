//! Item query functions.
//!
//! Every write here also bumps the owning wishlist's modification time, so
//! followers can tell that something changed since their last visit.

use rusqlite::{Connection, OptionalExtension, Row};
use souhaits_types::{Item, ItemId, Score, Timestamp, WishlistId};

use crate::queries::{reservations, wishlists};
use crate::Result;

const COLUMNS: &str = "i.id, i.list, i.title, i.description, i.link, i.score";

pub(crate) fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Item> {
    let raw_score: i64 = row.get(offset + 5)?;
    let score = Score::try_from(raw_score).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            offset + 5,
            rusqlite::types::Type::Integer,
            Box::new(e),
        )
    })?;
    Ok(Item {
        id: row.get(offset)?,
        list: row.get(offset + 1)?,
        title: row.get(offset + 2)?,
        description: row.get(offset + 3)?,
        link: row.get(offset + 4)?,
        score,
    })
}

/// Editable fields of an item.
#[derive(Debug, Clone, Copy)]
pub struct ItemFields<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub link: &'a str,
    pub score: Score,
}

/// Insert an item with a caller-chosen id. Fails with a uniqueness violation
/// if the id is taken.
pub fn insert(
    conn: &Connection,
    id: ItemId,
    list: WishlistId,
    fields: ItemFields<'_>,
    now: Timestamp,
) -> Result<()> {
    conn.execute(
        "INSERT INTO item (id, list, title, description, link, score, created_at, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        rusqlite::params![
            id,
            list,
            fields.title,
            fields.description,
            fields.link,
            fields.score.as_i64(),
            now as i64,
        ],
    )?;
    wishlists::touch(conn, list, now)?;
    Ok(())
}

/// Get an item by id.
pub fn find(conn: &Connection, id: ItemId) -> Result<Option<Item>> {
    let item = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM item i WHERE i.id = ?1"),
            [id],
            |row| from_row(row, 0),
        )
        .optional()?;
    Ok(item)
}

/// Get an item by id, only if it belongs to `list`.
pub fn in_list(conn: &Connection, list: WishlistId, id: ItemId) -> Result<Option<Item>> {
    let item = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM item i WHERE i.list = ?1 AND i.id = ?2"),
            [list, id],
            |row| from_row(row, 0),
        )
        .optional()?;
    Ok(item)
}

/// Rewrite an item.
pub fn update(conn: &Connection, id: ItemId, fields: ItemFields<'_>, now: Timestamp) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE item SET title = ?1, description = ?2, link = ?3, score = ?4, modified_at = ?5
         WHERE id = ?6",
        rusqlite::params![
            fields.title,
            fields.description,
            fields.link,
            fields.score.as_i64(),
            now as i64,
            id,
        ],
    )?;
    if updated > 0 {
        touch_list_of(conn, id, now)?;
    }
    Ok(updated > 0)
}

/// Delete an item; its reservation goes with it.
pub fn delete(conn: &Connection, id: ItemId, now: Timestamp) -> Result<bool> {
    touch_list_of(conn, id, now)?;
    let deleted = conn.execute("DELETE FROM item WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

fn touch_list_of(conn: &Connection, id: ItemId, now: Timestamp) -> Result<()> {
    conn.execute(
        "UPDATE wishlist SET modified_at = ?1 WHERE id = (SELECT list FROM item WHERE id = ?2)",
        rusqlite::params![now as i64, id],
    )?;
    Ok(())
}

/// Items of a list with their reservation, if any.
///
/// Sorted by score (decreasing), then modification time (decreasing).
pub fn for_list(conn: &Connection, list: WishlistId) -> Result<Vec<ItemRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS}, r.item, r.owner, u.email, r.status, r.confirmed_at
         FROM item i
         LEFT JOIN reservation r ON r.item = i.id
         LEFT JOIN user u ON u.id = r.owner
         WHERE i.list = ?1
         ORDER BY i.score DESC, i.modified_at DESC"
    ))?;

    let rows = stmt
        .query_map([list], |row| {
            let item = from_row(row, 0)?;
            let reserved: Option<ItemId> = row.get(6)?;
            let reservation = match reserved {
                Some(_) => Some(reservations::from_row(row, 6)?),
                None => None,
            };
            Ok(ItemRow { item, reservation })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// An item joined with its reservation.
#[derive(Debug, Clone)]
pub struct ItemRow {
    pub item: Item,
    pub reservation: Option<reservations::ReservationRow>,
}

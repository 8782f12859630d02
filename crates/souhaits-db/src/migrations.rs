//! Database migration system.
//!
//! Schema version stored in `PRAGMA user_version`. Migrations are
//! forward-only.

use rusqlite::Connection;

use crate::{schema, DbError, Result, SCHEMA_VERSION};

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<()> {
    let current_version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(DbError::Sqlite)?;

    if current_version > SCHEMA_VERSION {
        return Err(DbError::Migration(format!(
            "Database version {current_version} is newer than supported {SCHEMA_VERSION}"
        )));
    }

    // v1 is the only schema so far; later versions get their steps here.
    if current_version == 0 {
        tracing::info!("Initializing database schema v{SCHEMA_VERSION}");
        conn.execute_batch(schema::SCHEMA_V1)
            .map_err(DbError::Sqlite)?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(DbError::Sqlite)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch("PRAGMA foreign_keys = ON;").expect("pragma");
        conn
    }

    #[test]
    fn test_fresh_migration() {
        let conn = fresh();
        run(&conn).expect("migrate");

        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("version");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_idempotent_migration() {
        let conn = fresh();
        run(&conn).expect("first run");
        run(&conn).expect("second run should be no-op");
    }

    #[test]
    fn test_current_database_left_untouched() {
        let conn = fresh();
        run(&conn).expect("migrate");
        conn.execute(
            "INSERT INTO user (email, created_at) VALUES ('a@test.com', 1)",
            [],
        )
        .expect("insert");
        run(&conn).expect("reopen");

        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))
            .expect("count");
        assert_eq!(users, 1);
    }

    #[test]
    fn test_newer_database_rejected() {
        let conn = fresh();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .expect("bump");
        assert!(matches!(run(&conn), Err(DbError::Migration(_))));
    }

    #[test]
    fn test_tables_and_indices_created() {
        let conn = fresh();
        run(&conn).expect("migrate");

        let expected_tables = [
            "user",
            "session",
            "challenge",
            "wishlist",
            "item",
            "reservation",
            "friend",
            "coeditor",
        ];
        for table in &expected_tables {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap_or_else(|_| panic!("table {table} check"));
            assert_eq!(count, 1, "Table '{table}' should exist");
        }

        let expected_indices = [
            "idx_wishlist_url",
            "idx_wishlist_owner",
            "idx_item_list",
            "idx_reservation_item",
            "idx_reservation_owner",
            "idx_user_email",
            "idx_session_user",
            "idx_friend_user",
            "idx_coeditor_list",
        ];
        for index in &expected_indices {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name=?1",
                    [index],
                    |row| row.get(0),
                )
                .unwrap_or_else(|_| panic!("index {index} check"));
            assert_eq!(count, 1, "Index '{index}' should exist");
        }
    }
}

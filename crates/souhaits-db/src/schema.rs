//! SQL schema definitions.

/// Complete schema for the v1 database.
///
/// Cascades:
/// - deleting a user removes its wishlists, reservations, sessions,
///   challenges, follows and co-editor grants
/// - deleting a wishlist removes its items, follows and co-editors
/// - deleting an item removes its reservation
///
/// Wishlist modification times are maintained by the item queries, inside
/// the caller's transaction.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Identity
-- ============================================================

CREATE TABLE IF NOT EXISTS user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at INTEGER NOT NULL,
    email TEXT UNIQUE
);

CREATE INDEX IF NOT EXISTS idx_user_email ON user(email);

CREATE TABLE IF NOT EXISTS session (
    token TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL,
    activity_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_session_user ON session(user_id);
CREATE INDEX IF NOT EXISTS idx_session_activity ON session(activity_at);

CREATE TABLE IF NOT EXISTS challenge (
    token TEXT PRIMARY KEY,
    email TEXT NOT NULL,
    user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
    active INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_challenge_email ON challenge(email);
CREATE INDEX IF NOT EXISTS idx_challenge_user ON challenge(user_id);

-- ============================================================
-- Wishlists & items
-- ============================================================

CREATE TABLE IF NOT EXISTS wishlist (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL DEFAULT '',
    owner INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
    description TEXT NOT NULL DEFAULT '',
    show_reservations INTEGER NOT NULL DEFAULT 0,
    theme TEXT NOT NULL DEFAULT '',
    created_at INTEGER NOT NULL,
    modified_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_wishlist_url ON wishlist(url);
CREATE INDEX IF NOT EXISTS idx_wishlist_owner ON wishlist(owner);

CREATE TABLE IF NOT EXISTS item (
    id INTEGER PRIMARY KEY CHECK (id > 0 AND id < 2147483648),
    list INTEGER NOT NULL REFERENCES wishlist(id) ON DELETE CASCADE,
    title TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    link TEXT NOT NULL DEFAULT '',
    score INTEGER NOT NULL DEFAULT 2 CHECK (score BETWEEN 1 AND 3),
    created_at INTEGER NOT NULL,
    modified_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_item_list ON item(list);

-- ============================================================
-- Reservations
-- ============================================================

CREATE TABLE IF NOT EXISTS reservation (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item INTEGER NOT NULL UNIQUE REFERENCES item(id) ON DELETE CASCADE,
    owner INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
    status TEXT NOT NULL CHECK (status IN ('R', 'D')),
    created_at INTEGER NOT NULL,
    confirmed_at INTEGER,
    CHECK ((status = 'D') = (confirmed_at IS NOT NULL))
);

CREATE INDEX IF NOT EXISTS idx_reservation_item ON reservation(item);
CREATE INDEX IF NOT EXISTS idx_reservation_owner ON reservation(owner);

-- ============================================================
-- Sharing
-- ============================================================

CREATE TABLE IF NOT EXISTS friend (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    list INTEGER NOT NULL REFERENCES wishlist(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
    visit_at INTEGER NOT NULL,
    UNIQUE (list, user_id)
);

CREATE INDEX IF NOT EXISTS idx_friend_user ON friend(user_id);

CREATE TABLE IF NOT EXISTS coeditor (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    list INTEGER NOT NULL REFERENCES wishlist(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
    UNIQUE (list, user_id)
);

CREATE INDEX IF NOT EXISTS idx_coeditor_list ON coeditor(list);
CREATE INDEX IF NOT EXISTS idx_coeditor_user ON coeditor(user_id);
"#;

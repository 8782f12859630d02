//! # souhaits-types
//!
//! Plain domain records shared by the store, the service layer and whatever
//! presentation layer sits on top of them. Nothing in this crate touches the
//! database; every type is `Serialize` so a front end can consume it as-is.

pub mod identity;
pub mod item;
pub mod theme;
pub mod wishlist;

pub use identity::{IdentityState, User};
pub use item::{Holder, Item, ListedItem, ReservationState, ReservationStatus, Score};
pub use theme::{Theme, ThemeRegistry};
pub use wishlist::{FollowedList, Wishlist};

/// Common identifier aliases.
pub type UserId = i64;
pub type WishlistId = i64;
pub type ItemId = i64;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Seconds in one day.
pub const DAY_SECS: u64 = 24 * 60 * 60;

/// Largest item identifier; item ids are positive 31-bit integers.
pub const ITEM_ID_MAX: ItemId = (1 << 31) - 1;

/// Score given to newly created items.
pub const DEFAULT_SCORE: Score = Score::Normal;

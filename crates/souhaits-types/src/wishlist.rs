//! Wishlists.

use serde::{Deserialize, Serialize};

use crate::{UserId, WishlistId};

/// A wish list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    pub id: WishlistId,
    /// Globally unique, normalized URL fragment.
    pub url: String,
    pub name: String,
    pub description: String,
    pub owner: UserId,
    /// Let the owner see who reserved what.
    pub show_reservations: bool,
    /// Theme key; resolve it through a `ThemeRegistry`.
    pub theme: String,
}

/// A followed wishlist, with a freshness marker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowedList {
    pub list: Wishlist,
    /// The list changed since the follower last visited it.
    pub has_news: bool,
}

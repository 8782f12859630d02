//! Wishes and their reservation state.

use serde::{Deserialize, Serialize};

use crate::{ItemId, Timestamp, UserId, WishlistId};

/// How much the list owner wants an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Score {
    Low = 1,
    Normal = 2,
    High = 3,
}

/// A score outside `1..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("score must be 1, 2 or 3, got {0}")]
pub struct InvalidScore(pub i64);

impl Score {
    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for Score {
    type Error = InvalidScore;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Normal),
            3 => Ok(Self::High),
            other => Err(InvalidScore(other)),
        }
    }
}

/// A single wish in a wishlist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Random 31-bit identifier; appears in shared URLs.
    pub id: ItemId,
    pub list: WishlistId,
    pub title: String,
    pub description: String,
    /// Optional external link describing the wish.
    pub link: String,
    pub score: Score,
}

/// Reservation status as persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Reserved,
    Donated,
}

impl ReservationStatus {
    /// Single-letter code stored in the `reservation.status` column.
    pub fn code(self) -> &'static str {
        match self {
            Self::Reserved => "R",
            Self::Donated => "D",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "R" => Some(Self::Reserved),
            "D" => Some(Self::Donated),
            _ => None,
        }
    }
}

/// Identity of whoever holds a reservation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    pub id: UserId,
    pub email: Option<String>,
}

/// Per-item reservation state as seen by a caller.
///
/// `holder` is `None` when the caller is not allowed to know who holds it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ReservationState {
    Free,
    Reserved { holder: Option<Holder> },
    Donated { holder: Option<Holder>, confirmed_at: Timestamp },
}

impl ReservationState {
    /// Donated wishes no longer count as reserved for display.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::Reserved { .. })
    }
}

/// An item together with its reservation state, as listed on a wishlist page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedItem {
    pub item: Item,
    pub reservation: ReservationState,
}

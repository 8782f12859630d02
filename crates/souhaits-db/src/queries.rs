//! Database query functions organized by table.

pub mod challenges;
pub mod coeditors;
pub mod friends;
pub mod gc;
pub mod items;
pub mod reservations;
pub mod sessions;
pub mod users;
pub mod wishlists;

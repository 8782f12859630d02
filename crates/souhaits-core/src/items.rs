//! Wishes on a list.

use rand::Rng;
use souhaits_db::alloc::insert_unique;
use souhaits_db::queries::items::{self, ItemFields};
use souhaits_db::queries::{reservations, wishlists};
use souhaits_types::{
    Item, ItemId, ListedItem, ReservationState, ReservationStatus, Score, User, Wishlist,
    DEFAULT_SCORE, ITEM_ID_MAX,
};
use tracing::{debug, info};

use crate::{messages, Result, Service, ServiceError};

/// Random item ids tried before giving up.
pub const MAX_ITEM_ID_ATTEMPTS: usize = 16;

/// New content for an existing wish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEdit {
    pub title: String,
    pub description: String,
    pub link: String,
    /// 1 (low) to 3 (high).
    pub score: i64,
}

fn random_ids() -> impl Iterator<Item = ItemId> {
    let mut rng = rand::thread_rng();
    std::iter::repeat_with(move || rng.gen_range(1..=ITEM_ID_MAX))
}

impl Service {
    /// Add a wish to `list` with a random id and the default score.
    pub fn add_item(&self, list: &Wishlist, title: &str, description: &str, link: &str) -> Result<Item> {
        self.add_item_with_ids(list, title, description, link, random_ids())
    }

    /// Like [`Service::add_item`], drawing candidate ids from `ids`.
    pub fn add_item_with_ids(
        &self,
        list: &Wishlist,
        title: &str,
        description: &str,
        link: &str,
        ids: impl IntoIterator<Item = ItemId>,
    ) -> Result<Item> {
        let fields = ItemFields {
            title,
            description,
            link,
            score: DEFAULT_SCORE,
        };
        let now = self.now();
        let (id, ()) = self.write(|tx| {
            Ok(insert_unique(ids, MAX_ITEM_ID_ATTEMPTS, |id| {
                items::insert(tx, *id, list.id, fields, now)
            })?)
        })?;
        debug!(list = list.id, item = id, "item added");
        Ok(Item {
            id,
            list: list.id,
            title: title.to_string(),
            description: description.to_string(),
            link: link.to_string(),
            score: DEFAULT_SCORE,
        })
    }

    /// Rewrite a wish. A wish marked as given goes back on the list.
    pub fn edit_item(&self, item: &Item, edit: &ItemEdit) -> Result<Item> {
        let score = Score::try_from(edit.score)
            .map_err(|e| ServiceError::Validation(e.to_string()))?;
        let fields = ItemFields {
            title: &edit.title,
            description: &edit.description,
            link: &edit.link,
            score,
        };
        let now = self.now();
        self.write(|tx| {
            if !items::update(tx, item.id, fields, now)? {
                return Err(ServiceError::NotFound(format!("item {}", item.id)));
            }
            if reservations::clear_donated(tx, item.id)? {
                info!(item = item.id, "given wish put back on the list");
            }
            Ok(())
        })?;
        Ok(Item {
            id: item.id,
            list: item.list,
            title: edit.title.clone(),
            description: edit.description.clone(),
            link: edit.link.clone(),
            score,
        })
    }

    /// Delete a wish. With `notify`, a verified holder is told first.
    pub fn delete_item(&self, item: &Item, notify: bool) -> Result<()> {
        if notify {
            let (holder, list) = self.read(|conn| {
                Ok((
                    reservations::get(conn, item.id)?,
                    wishlists::find(conn, item.list)?,
                ))
            })?;
            if let (Some(reservation), Some(list)) = (holder, list) {
                if let Some(email) = &reservation.holder.email {
                    let reminder = self.login_reminder(&User {
                        id: reservation.holder.id,
                        email: Some(email.clone()),
                    })?;
                    self.notify(
                        email,
                        messages::item_deleted(&list.name, &item.title, reminder.as_deref()),
                    );
                }
            }
        }

        let now = self.now();
        let deleted = self.write(|tx| Ok(items::delete(tx, item.id, now)?))?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("item {}", item.id)));
        }
        debug!(list = item.list, item = item.id, "item deleted");
        Ok(())
    }

    /// The wish `id`, provided it belongs to `list`.
    pub fn item_in_list(&self, list: &Wishlist, id: ItemId) -> Result<Item> {
        self.read(|conn| {
            items::in_list(conn, list.id, id)?
                .ok_or_else(|| ServiceError::NotFound(format!("item {id} in list {}", list.url)))
        })
    }

    /// Every wish on `list`, best first. Holders are only named when
    /// `reveal_holders` is set.
    pub fn items_for_list(&self, list: &Wishlist, reveal_holders: bool) -> Result<Vec<ListedItem>> {
        let rows = self.read(|conn| Ok(items::for_list(conn, list.id)?))?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let reservation = match row.reservation {
                    None => ReservationState::Free,
                    Some(r) => {
                        let holder = reveal_holders.then_some(r.holder);
                        match (r.status, r.confirmed_at) {
                            (ReservationStatus::Donated, Some(confirmed_at)) => {
                                ReservationState::Donated {
                                    holder,
                                    confirmed_at,
                                }
                            }
                            _ => ReservationState::Reserved { holder },
                        }
                    }
                };
                ListedItem {
                    item: row.item,
                    reservation,
                }
            })
            .collect())
    }
}

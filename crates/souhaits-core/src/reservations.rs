//! Reservation engine.
//!
//! `Free -> Reserved(holder) -> Donated(holder, confirmed_at)`, and back from
//! Reserved to Free when the holder gives up. The store's UNIQUE constraint
//! on `reservation.item` decides races between concurrent reservers.

use std::collections::BTreeMap;

use souhaits_db::queries::{items, reservations, users, wishlists};
use souhaits_types::{Holder, Item, ItemId, ReservationStatus, User, Wishlist};
use tracing::{debug, info};

use crate::{messages, Result, Service, ServiceError};

impl Service {
    /// Reserve `item` for `user`. Returns `false` if someone holds it
    /// already.
    pub fn reserve(&self, user: &User, item: &Item) -> Result<bool> {
        let now = self.now();
        let reserved = self.write(|tx| {
            if items::find(tx, item.id)?.is_none() {
                return Err(ServiceError::NotFound(format!("item {}", item.id)));
            }
            let list = wishlists::get(tx, item.list)?;
            if list.owner == user.id {
                return Err(ServiceError::Permission(
                    "cannot reserve a wish on your own list".into(),
                ));
            }
            Ok(reservations::insert(tx, item.id, user.id, now)?)
        })?;
        debug!(user = user.id, item = item.id, reserved, "reservation attempt");
        Ok(reserved)
    }

    /// Release `user`'s reservation on `item`. Anything else is a no-op.
    pub fn give_up(&self, user: &User, item: &Item) -> Result<bool> {
        let released = self.write(|tx| Ok(reservations::release(tx, item.id, user.id)?))?;
        debug!(user = user.id, item = item.id, released, "reservation released");
        Ok(released)
    }

    /// Record that `user` gave `item`. The list owner hears about it once;
    /// repeating the call succeeds silently.
    pub fn mark_donated(&self, user: &User, item: &Item) -> Result<bool> {
        let Some(giver) = user.email.as_deref() else {
            return Ok(false);
        };
        let now = self.now();
        let changed = self.write(|tx| Ok(reservations::mark_donated(tx, item.id, user.id, now)?))?;
        if !changed {
            let current = self.read(|conn| Ok(reservations::get(conn, item.id)?))?;
            return Ok(current.is_some_and(|r| {
                r.holder.id == user.id && r.status == ReservationStatus::Donated
            }));
        }
        info!(user = user.id, item = item.id, "wish given");

        let found = self.read(|conn| {
            let Some(list) = wishlists::find(conn, item.list)? else {
                return Ok(None);
            };
            let owner = users::find(conn, list.owner)?;
            Ok(owner.map(|o| (list, o)))
        })?;
        if let Some((list, owner)) = found {
            if let Some(email) = &owner.email {
                let link = format!(
                    "{}/{}/{}",
                    self.config.base_url.trim_end_matches('/'),
                    list.url,
                    item.id
                );
                let reminder = self.login_reminder(&owner)?;
                self.notify(
                    email,
                    messages::donated(giver, &item.title, &link, reminder.as_deref()),
                );
            }
        }
        Ok(true)
    }

    /// True iff `item` is currently Reserved (not Donated).
    pub fn is_reserved(&self, item: &Item) -> Result<bool> {
        self.read(|conn| Ok(reservations::is_reserved(conn, item.id)?))
    }

    /// Holders of the Reserved wishes on `list`.
    pub fn list_reservations(&self, list: &Wishlist) -> Result<BTreeMap<ItemId, Holder>> {
        let rows = self.read(|conn| Ok(reservations::reserved_in_list(conn, list.id)?))?;
        Ok(rows.into_iter().map(|r| (r.item, r.holder)).collect())
    }

    /// Wishes `user` has reserved and not given yet.
    pub fn user_reservations(&self, user: &User) -> Result<Vec<Item>> {
        self.read(|conn| Ok(reservations::held_by(conn, user.id)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use souhaits_types::ReservationState;

    struct Setup {
        fx: Fixture,
        owner: User,
        giver: User,
        list: Wishlist,
        item: Item,
    }

    fn setup() -> Setup {
        let fx = fixture();
        let owner = fx.verified("o@test.com");
        let giver = fx.verified("g@test.com");
        let list = fx.service.create_wishlist(&owner, "Noël", None).expect("list");
        let item = fx.service.add_item(&list, "Bike", "", "").expect("item");
        Setup {
            fx,
            owner,
            giver,
            list,
            item,
        }
    }

    #[test]
    fn test_reserve_once() {
        let s = setup();
        let other = s.fx.verified("x@test.com");
        assert!(s.fx.service.reserve(&s.giver, &s.item).expect("reserve"));
        assert!(!s.fx.service.reserve(&other, &s.item).expect("reserve"));
        assert!(!s.fx.service.reserve(&s.giver, &s.item).expect("reserve"));
        assert!(s.fx.service.is_reserved(&s.item).expect("reserved"));

        let held = s.fx.service.list_reservations(&s.list).expect("list");
        assert_eq!(held.get(&s.item.id).map(|h| h.id), Some(s.giver.id));
        assert_eq!(
            s.fx.service.user_reservations(&s.giver).expect("mine"),
            [s.item.clone()]
        );
    }

    #[test]
    fn test_owner_cannot_reserve() {
        let s = setup();
        assert!(matches!(
            s.fx.service.reserve(&s.owner, &s.item),
            Err(ServiceError::Permission(_))
        ));
    }

    #[test]
    fn test_give_up_only_by_holder() {
        let s = setup();
        let other = s.fx.verified("x@test.com");
        s.fx.service.reserve(&s.giver, &s.item).expect("reserve");
        assert!(!s.fx.service.give_up(&other, &s.item).expect("give up"));
        assert!(s.fx.service.give_up(&s.giver, &s.item).expect("give up"));
        assert!(!s.fx.service.give_up(&s.giver, &s.item).expect("give up again"));
        assert!(!s.fx.service.is_reserved(&s.item).expect("reserved"));
    }

    #[test]
    fn test_donate_notifies_owner_once() {
        let s = setup();
        s.fx.service.reserve(&s.giver, &s.item).expect("reserve");
        assert!(s.fx.service.mark_donated(&s.giver, &s.item).expect("donate"));
        assert!(s.fx.service.mark_donated(&s.giver, &s.item).expect("donate again"));

        let sent = s.fx.outbox.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "o@test.com");
        assert!(sent[0].body.contains("g@test.com"));
        assert!(sent[0]
            .body
            .contains(&format!("/{}/{}", s.list.url, s.item.id)));

        assert!(!s.fx.service.is_reserved(&s.item).expect("reserved"));
        let listed = s.fx.service.items_for_list(&s.list, false).expect("items");
        assert_eq!(
            listed[0].reservation,
            ReservationState::Donated {
                holder: None,
                confirmed_at: T0
            }
        );
        // A given wish cannot be released.
        assert!(!s.fx.service.give_up(&s.giver, &s.item).expect("give up"));
    }

    #[test]
    fn test_donate_requirements() {
        let s = setup();
        let (anon, _) = s.fx.anonymous();
        s.fx.service.reserve(&anon, &s.item).expect("reserve");
        assert!(!s.fx.service.mark_donated(&anon, &s.item).expect("donate"));
        assert!(!s.fx.service.mark_donated(&s.giver, &s.item).expect("donate"));
        assert!(s.fx.outbox.is_empty());
    }

    #[test]
    fn test_reserve_deleted_item() {
        let s = setup();
        s.fx.service.delete_item(&s.item, false).expect("delete");
        assert!(matches!(
            s.fx.service.reserve(&s.giver, &s.item),
            Err(ServiceError::NotFound(_))
        ));
    }
}

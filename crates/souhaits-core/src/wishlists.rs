//! Wishlists: creation, settings, co-editors, follows and destruction.

use std::collections::{BTreeMap, BTreeSet};

use souhaits_db::alloc::insert_unique;
use souhaits_db::queries::{coeditors, friends, reservations, users, wishlists};
use souhaits_types::{FollowedList, Holder, Theme, User, UserId, Wishlist, WishlistId};
use tracing::info;

use crate::email::normalize_email;
use crate::{messages, slug, Result, Service, ServiceError};

/// Slug candidates are `base`, `base-1`, `base-2`, ... with no practical end.
const MAX_SLUG_ATTEMPTS: usize = usize::MAX;

/// A partial update: `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WishlistUpdate {
    pub title: Option<String>,
    /// Free text; normalized and made unique like a new list's name.
    pub url: Option<String>,
    pub description: Option<String>,
    pub show_reservations: Option<bool>,
    pub theme: Option<String>,
    /// Replaces the whole co-editor set.
    pub co_editors: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// The list's URL after the update.
    pub url: String,
    /// Co-editor addresses that matched no verified user.
    pub unknown_co_editors: Vec<String>,
}

impl Service {
    /// Create a wishlist named `name` for `owner`.
    ///
    /// An unverified owner may pass an email to claim at the same time; a
    /// malformed address fails the whole operation before anything is
    /// created.
    pub fn create_wishlist(&self, owner: &User, name: &str, email: Option<&str>) -> Result<Wishlist> {
        if !owner.is_verified() {
            if let Some(raw) = email.filter(|e| !e.trim().is_empty()) {
                self.issue_challenge(owner, raw)?;
            }
        }

        let base = self.slugs.normalize(name);
        let now = self.now();
        let list = self.write(|tx| {
            let (_, id) = insert_unique(slug::candidates(&base), MAX_SLUG_ATTEMPTS, |url| {
                wishlists::insert(tx, url, name, owner.id, now)
            })?;
            Ok(wishlists::get(tx, id)?)
        })?;
        info!(list = list.id, url = %list.url, owner = owner.id, "wishlist created");
        Ok(list)
    }

    /// Apply a partial update to `list`.
    pub fn update_wishlist(&self, list: &Wishlist, update: WishlistUpdate) -> Result<UpdateOutcome> {
        if let Some(key) = &update.theme {
            if self.themes.find(key).is_none() {
                return Err(ServiceError::Validation(format!("unknown theme {key:?}")));
            }
        }
        let base = update.url.as_deref().map(|u| self.slugs.normalize(u));
        let now = self.now();

        let outcome = self.write(|tx| {
            if let Some(title) = &update.title {
                wishlists::set_name(tx, list.id, title)?;
            }
            if let Some(description) = &update.description {
                wishlists::set_description(tx, list.id, description)?;
            }
            if let Some(show) = update.show_reservations {
                wishlists::set_show_reservations(tx, list.id, show)?;
            }
            if let Some(theme) = &update.theme {
                wishlists::set_theme(tx, list.id, theme)?;
            }

            let url = match &base {
                Some(base) => {
                    let (url, ()) = insert_unique(slug::candidates(base), MAX_SLUG_ATTEMPTS, |url| {
                        wishlists::set_url(tx, list.id, url)
                    })?;
                    url
                }
                None => wishlists::get(tx, list.id)?.url,
            };

            let mut unknown_co_editors = Vec::new();
            if let Some(emails) = &update.co_editors {
                coeditors::clear(tx, list.id)?;
                let mut granted = BTreeSet::new();
                for raw in emails {
                    let found = match normalize_email(raw) {
                        Some(email) => users::by_email(tx, &email)?,
                        None => None,
                    };
                    match found {
                        Some(user) if user.id == list.owner => {}
                        Some(user) => {
                            if granted.insert(user.id) {
                                coeditors::insert(tx, list.id, user.id)?;
                            }
                        }
                        None => unknown_co_editors.push(raw.clone()),
                    }
                }
            }

            wishlists::touch(tx, list.id, now)?;
            Ok(UpdateOutcome {
                url,
                unknown_co_editors,
            })
        })?;
        info!(list = list.id, url = %outcome.url, "wishlist updated");
        Ok(outcome)
    }

    /// Delete `list` and everything on it. Holders of reserved wishes are
    /// told which of their reservations went away.
    pub fn destroy_wishlist(&self, list: &Wishlist) -> Result<()> {
        let held = self.read(|conn| Ok(reservations::reserved_titles_in_list(conn, list.id)?))?;
        let mut per_holder: BTreeMap<UserId, (Holder, Vec<String>)> = BTreeMap::new();
        for (holder, title) in held {
            per_holder
                .entry(holder.id)
                .or_insert_with(|| (holder, Vec::new()))
                .1
                .push(title);
        }

        for (id, (holder, titles)) in per_holder {
            let Some(email) = holder.email else {
                continue;
            };
            let reminder = self.login_reminder(&User {
                id,
                email: Some(email.clone()),
            })?;
            self.notify(
                &email,
                messages::list_destroyed(&list.name, &titles, reminder.as_deref()),
            );
        }

        let deleted = self.write(|tx| Ok(wishlists::delete(tx, list.id)?))?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("wishlist {}", list.id)));
        }
        info!(list = list.id, url = %list.url, "wishlist destroyed");
        Ok(())
    }

    pub fn wishlist_by_url(&self, url: &str) -> Result<Option<Wishlist>> {
        self.read(|conn| Ok(wishlists::by_url(conn, url)?))
    }

    pub fn wishlist_by_id(&self, id: WishlistId) -> Result<Option<Wishlist>> {
        self.read(|conn| Ok(wishlists::find(conn, id)?))
    }

    pub fn wishlists_owned_by(&self, user: &User) -> Result<Vec<Wishlist>> {
        self.read(|conn| Ok(wishlists::owned_by(conn, user.id)?))
    }

    pub fn co_editors(&self, list: &Wishlist) -> Result<Vec<User>> {
        self.read(|conn| Ok(coeditors::users_for(conn, list.id)?))
    }

    /// Grant edit rights to the verified user owning `email`.
    pub fn add_co_editor(&self, list: &Wishlist, email: &str) -> Result<User> {
        let email = normalize_email(email)
            .ok_or_else(|| ServiceError::Validation(format!("invalid email address: {email:?}")))?;
        self.write(|tx| {
            let user = users::by_email(tx, &email)?
                .ok_or_else(|| ServiceError::NotFound(format!("no user with email {email}")))?;
            if user.id == list.owner {
                return Err(ServiceError::Conflict("the owner already edits the list".into()));
            }
            coeditors::insert(tx, list.id, user.id)?;
            Ok(user)
        })
    }

    pub fn remove_co_editor(&self, list: &Wishlist, user: &User) -> Result<bool> {
        self.write(|tx| Ok(coeditors::remove(tx, list.id, user.id)?))
    }

    /// Owners and co-editors may edit a list's items.
    pub fn can_edit(&self, user: &User, list: &Wishlist) -> Result<bool> {
        if user.id == list.owner {
            return Ok(true);
        }
        self.read(|conn| Ok(coeditors::contains(conn, list.id, user.id)?))
    }

    pub fn ensure_can_edit(&self, user: &User, list: &Wishlist) -> Result<()> {
        if self.can_edit(user, list)? {
            Ok(())
        } else {
            Err(ServiceError::Permission(format!(
                "user {} may not edit list {}",
                user.id, list.url
            )))
        }
    }

    /// Only the owner may change settings or destroy a list.
    pub fn ensure_owner(&self, user: &User, list: &Wishlist) -> Result<()> {
        if user.id == list.owner {
            Ok(())
        } else {
            Err(ServiceError::Permission(format!(
                "user {} does not own list {}",
                user.id, list.url
            )))
        }
    }

    /// Record that `user` is looking at `list`. Owners do not follow their
    /// own lists.
    pub fn follow(&self, user: &User, list: &Wishlist) -> Result<()> {
        if user.id == list.owner {
            return Ok(());
        }
        let now = self.now();
        self.write(|tx| Ok(friends::visit(tx, list.id, user.id, now)?))
    }

    pub fn unfollow(&self, user: &User, list: &Wishlist) -> Result<bool> {
        self.write(|tx| Ok(friends::remove(tx, list.id, user.id)?))
    }

    /// Lists `user` follows, flagged when changed since the last visit.
    pub fn followed_lists(&self, user: &User) -> Result<Vec<FollowedList>> {
        self.read(|conn| Ok(friends::followed_by(conn, user.id)?))
    }

    /// The theme a list is shown with.
    pub fn theme_of(&self, list: &Wishlist) -> &'static Theme {
        self.themes.resolve(&list.theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn test_slug_allocation() {
        let fx = fixture();
        let owner = fx.verified("o@test.com");
        let first = fx.service.create_wishlist(&owner, "Le Noël de Pierre", None).expect("list");
        let second = fx.service.create_wishlist(&owner, "Le Noël de Pierre", None).expect("list");
        assert_eq!(first.url, "le-noel-de-pierre");
        assert_eq!(second.url, "le-noel-de-pierre-1");

        let reserved = fx.service.create_wishlist(&owner, "Login", None).expect("list");
        assert_eq!(reserved.url, "login-1");

        let empty = fx.service.create_wishlist(&owner, "???", None).expect("list");
        assert_eq!(empty.url, "-1");
        let empty_again = fx.service.create_wishlist(&owner, "", None).expect("list");
        assert_eq!(empty_again.url, "-2");
    }

    #[test]
    fn test_create_with_email_claims_it() {
        let fx = fixture();
        let (anon, _) = fx.anonymous();
        fx.service
            .create_wishlist(&anon, "Anniversaire", Some("me@test.com"))
            .expect("list");
        assert_eq!(fx.outbox.sent_to("me@test.com").len(), 1);
        assert_eq!(
            fx.service.pending_email(&anon).expect("pending").as_deref(),
            Some("me@test.com")
        );
    }

    #[test]
    fn test_create_with_bad_email_creates_nothing() {
        let fx = fixture();
        let (anon, _) = fx.anonymous();
        assert!(matches!(
            fx.service.create_wishlist(&anon, "List", Some("garbage")),
            Err(ServiceError::Validation(_))
        ));
        assert!(fx.service.wishlists_owned_by(&anon).expect("owned").is_empty());

        // Blank means "no email".
        fx.service.create_wishlist(&anon, "List", Some("  ")).expect("list");
        assert!(fx.outbox.is_empty());
    }

    #[test]
    fn test_update_partial_fields() {
        let fx = fixture();
        let owner = fx.verified("o@test.com");
        let list = fx.service.create_wishlist(&owner, "Noël", None).expect("list");

        let outcome = fx
            .service
            .update_wishlist(
                &list,
                WishlistUpdate {
                    description: Some("For Santa".into()),
                    theme: Some("xmas".into()),
                    ..Default::default()
                },
            )
            .expect("update");
        assert_eq!(outcome.url, "noel");
        let list = fx.service.wishlist_by_id(list.id).expect("get").expect("exists");
        assert_eq!(list.name, "Noël");
        assert_eq!(list.description, "For Santa");
        assert_eq!(fx.service.theme_of(&list).key, "xmas");
    }

    #[test]
    fn test_update_url_is_reallocated() {
        let fx = fixture();
        let owner = fx.verified("o@test.com");
        let a = fx.service.create_wishlist(&owner, "Alpha", None).expect("list");
        let b = fx.service.create_wishlist(&owner, "Beta", None).expect("list");

        let outcome = fx
            .service
            .update_wishlist(
                &b,
                WishlistUpdate {
                    url: Some("ALPHA".into()),
                    ..Default::default()
                },
            )
            .expect("update");
        assert_eq!(outcome.url, "alpha-1");

        // Keeping one's own URL is not a conflict.
        let outcome = fx
            .service
            .update_wishlist(
                &a,
                WishlistUpdate {
                    url: Some("alpha".into()),
                    ..Default::default()
                },
            )
            .expect("update");
        assert_eq!(outcome.url, "alpha");
    }

    #[test]
    fn test_update_rejects_unknown_theme() {
        let fx = fixture();
        let owner = fx.verified("o@test.com");
        let list = fx.service.create_wishlist(&owner, "L", None).expect("list");
        let result = fx.service.update_wishlist(
            &list,
            WishlistUpdate {
                title: Some("changed".into()),
                theme: Some("neon".into()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(ServiceError::Validation(_))));
        let list = fx.service.wishlist_by_id(list.id).expect("get").expect("exists");
        assert_eq!(list.name, "L");
    }

    #[test]
    fn test_co_editor_set_replacement() {
        let fx = fixture();
        let owner = fx.verified("o@test.com");
        let helper = fx.verified("h@test.com");
        let list = fx.service.create_wishlist(&owner, "L", None).expect("list");

        let outcome = fx
            .service
            .update_wishlist(
                &list,
                WishlistUpdate {
                    co_editors: Some(vec![
                        "H@test.com".into(),
                        "h@test.com".into(),
                        "ghost@test.com".into(),
                    ]),
                    ..Default::default()
                },
            )
            .expect("update");
        assert_eq!(outcome.unknown_co_editors, ["ghost@test.com"]);
        assert_eq!(fx.service.co_editors(&list).expect("co-editors"), [helper.clone()]);
        assert!(fx.service.can_edit(&helper, &list).expect("can edit"));
        assert!(fx.service.ensure_can_edit(&helper, &list).is_ok());
        assert!(matches!(
            fx.service.ensure_owner(&helper, &list),
            Err(ServiceError::Permission(_))
        ));

        fx.service
            .update_wishlist(
                &list,
                WishlistUpdate {
                    co_editors: Some(Vec::new()),
                    ..Default::default()
                },
            )
            .expect("update");
        assert!(!fx.service.can_edit(&helper, &list).expect("can edit"));
    }

    #[test]
    fn test_add_co_editor() {
        let fx = fixture();
        let owner = fx.verified("o@test.com");
        let helper = fx.verified("h@test.com");
        let list = fx.service.create_wishlist(&owner, "L", None).expect("list");

        assert_eq!(fx.service.add_co_editor(&list, "h@test.com").expect("add"), helper);
        assert!(matches!(
            fx.service.add_co_editor(&list, "h@test.com"),
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            fx.service.add_co_editor(&list, "nobody@test.com"),
            Err(ServiceError::NotFound(_))
        ));
        assert!(fx.service.remove_co_editor(&list, &helper).expect("remove"));
    }

    #[test]
    fn test_follow_and_news() {
        let fx = fixture();
        let owner = fx.verified("o@test.com");
        let fan = fx.verified("f@test.com");
        let list = fx.service.create_wishlist(&owner, "L", None).expect("list");

        fx.service.follow(&owner, &list).expect("owner visit");
        assert!(fx.service.followed_lists(&owner).expect("followed").is_empty());

        fx.clock.advance(10);
        fx.service.follow(&fan, &list).expect("follow");
        assert!(!fx.service.followed_lists(&fan).expect("followed")[0].has_news);

        fx.clock.advance(10);
        fx.service.add_item(&list, "Bike", "", "").expect("item");
        assert!(fx.service.followed_lists(&fan).expect("followed")[0].has_news);

        assert!(fx.service.unfollow(&fan, &list).expect("unfollow"));
        assert!(fx.service.followed_lists(&fan).expect("followed").is_empty());
    }

    #[test]
    fn test_destroy_notifies_each_verified_holder_once() {
        let fx = fixture();
        let owner = fx.verified("o@test.com");
        let giver = fx.verified("g@test.com");
        let (anon, _) = fx.anonymous();
        let list = fx.service.create_wishlist(&owner, "Noël", None).expect("list");
        let bike = fx.service.add_item(&list, "Bike", "", "").expect("item");
        let book = fx.service.add_item(&list, "Book", "", "").expect("item");
        let lamp = fx.service.add_item(&list, "Lamp", "", "").expect("item");
        assert!(fx.service.reserve(&giver, &bike).expect("reserve"));
        assert!(fx.service.reserve(&giver, &book).expect("reserve"));
        assert!(fx.service.reserve(&anon, &lamp).expect("reserve"));

        fx.service.destroy_wishlist(&list).expect("destroy");
        let sent = fx.outbox.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "g@test.com");
        assert!(sent[0].body.contains("Bike") && sent[0].body.contains("Book"));
        assert!(fx.service.wishlist_by_id(list.id).expect("get").is_none());
        assert!(fx.service.item_in_list(&list, bike.id).is_err());

        assert!(matches!(
            fx.service.destroy_wishlist(&list),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn test_unknown_stored_theme_falls_back() {
        let fx = fixture();
        let owner = fx.verified("o@test.com");
        let mut list = fx.service.create_wishlist(&owner, "L", None).expect("list");
        list.theme = "gone".into();
        assert_eq!(fx.service.theme_of(&list).key, "default");
    }
}

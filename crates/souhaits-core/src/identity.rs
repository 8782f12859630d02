//! Identity and session management.
//!
//! Every visitor gets an anonymous user and a session at first contact.
//! Claiming an email issues a challenge; opening the challenge link proves
//! ownership. If the email already belongs to a verified user, the
//! anonymous user's data is folded into that account and the anonymous
//! user disappears.

use souhaits_db::queries::{challenges, friends, reservations, sessions, users, wishlists};
use souhaits_db::rusqlite::Connection;
use souhaits_types::{IdentityState, User, UserId, Wishlist};
use tracing::{debug, info};

use crate::email::{fold_email, normalize_email};
use crate::messages::{self, challenge_link};
use crate::{token, Envelope, Result, Service, ServiceError};

fn validated_email(raw: &str) -> Result<String> {
    normalize_email(raw)
        .ok_or_else(|| ServiceError::Validation(format!("invalid email address: {raw:?}")))
}

/// Counts of what a merge moved over.
#[derive(Debug, Default)]
struct MergeReport {
    wishlists: usize,
    follows: usize,
    reservations: usize,
    discarded: usize,
}

/// Fold `pending` into `real` and delete `pending`.
fn merge_into(conn: &Connection, pending: UserId, real: UserId) -> Result<MergeReport> {
    let wishlists = wishlists::transfer_owner(conn, pending, real)?;
    let follows = friends::merge_into(conn, pending, real)?;
    friends::remove_own_lists(conn, real)?;
    let reservations = reservations::transfer_holder(conn, pending, real)?;
    // A reservation on a wish that now belongs to `real` makes no sense.
    let discarded = reservations::delete_self_reservations(conn, real)?;
    users::delete(conn, pending)?;
    Ok(MergeReport {
        wishlists,
        follows,
        reservations,
        discarded,
    })
}

impl Service {
    /// Create a fresh anonymous user and a session for it.
    pub fn create_anonymous_session(&self) -> Result<(User, String)> {
        let now = self.now();
        let session = token::generate();
        let user = self.write(|tx| {
            let id = users::insert_anonymous(tx, now)?;
            sessions::insert(tx, &session, id, now)?;
            Ok(User { id, email: None })
        })?;
        info!(user = user.id, "anonymous session created");
        Ok((user, session))
    }

    /// The user behind a session token. Slides the session's expiry.
    pub fn lookup_session(&self, session: &str) -> Result<User> {
        let now = self.now();
        self.write(|tx| {
            let user = sessions::user_for(tx, session)?
                .ok_or_else(|| ServiceError::NotFound("unknown session".into()))?;
            sessions::touch(tx, session, now)?;
            Ok(user)
        })
    }

    /// Forget a session. Returns whether it existed.
    pub fn destroy_session(&self, session: &str) -> Result<bool> {
        self.write(|tx| Ok(sessions::delete(tx, session)?))
    }

    /// Start proving that `user` owns `raw_email`. Any earlier active
    /// challenge for the address stops working. Returns the new token.
    pub fn issue_challenge(&self, user: &User, raw_email: &str) -> Result<String> {
        let email = validated_email(raw_email)?;
        let now = self.now();
        let token = token::generate();
        self.write(|tx| {
            let revoked = challenges::delete_active_for_email(tx, &email)?;
            if revoked > 0 {
                debug!(revoked, "previous login links revoked");
            }
            challenges::insert(tx, &token, &email, user.id, now)?;
            Ok(())
        })?;
        info!(user = user.id, "challenge issued");

        let link = challenge_link(&self.config.base_url, &token);
        self.notify(&email, messages::challenge(&self.config.admin_name, &link));
        Ok(token)
    }

    /// Answer a challenge and return the user now owning its email.
    ///
    /// `session`, when given, ends up logged in as that user. If the email
    /// already belonged to another verified account and the challenge was
    /// issued to a pending user, the pending user is merged into that
    /// account. A verified user is never merged or overwritten: answering a
    /// challenge for a different address just switches to the account that
    /// owns it, creating one if needed.
    pub fn resolve_challenge(&self, token: &str, session: Option<&str>) -> Result<User> {
        let now = self.now();
        let (user, merged) = self.write(|tx| {
            let challenge = challenges::get(tx, token)?
                .ok_or_else(|| ServiceError::NotFound("unknown or expired challenge".into()))?;
            challenges::activate(tx, token)?;

            let claimant = users::get(tx, challenge.user)?;
            let owner = users::by_email(tx, &challenge.email)?;

            let (real, merged) = match owner {
                Some(owner) if owner.id == claimant.id => (owner, None),
                Some(owner) => {
                    // Move the session first: deleting the claimant would
                    // cascade to it.
                    if let Some(session) = session {
                        sessions::reassign(tx, session, owner.id)?;
                    }
                    challenges::reassign(tx, token, owner.id)?;
                    let merged = if claimant.is_verified() {
                        None
                    } else {
                        Some(merge_into(tx, claimant.id, owner.id)?)
                    };
                    (owner, merged)
                }
                None if !claimant.is_verified() => {
                    users::set_email(tx, claimant.id, &challenge.email)?;
                    let promoted = User {
                        id: claimant.id,
                        email: Some(challenge.email.clone()),
                    };
                    (promoted, None)
                }
                None => {
                    let id = users::insert_anonymous(tx, now)?;
                    users::set_email(tx, id, &challenge.email)?;
                    challenges::reassign(tx, token, id)?;
                    let fresh = User {
                        id,
                        email: Some(challenge.email.clone()),
                    };
                    (fresh, None)
                }
            };

            if let Some(session) = session {
                sessions::reassign(tx, session, real.id)?;
            }
            Ok((real, merged.map(|m| (claimant.id, m))))
        })?;

        match merged {
            Some((pending, report)) => info!(
                pending,
                user = user.id,
                wishlists = report.wishlists,
                follows = report.follows,
                reservations = report.reservations,
                discarded = report.discarded,
                "pending user merged"
            ),
            None => info!(user = user.id, "challenge resolved"),
        }
        Ok(user)
    }

    pub fn user_by_id(&self, id: UserId) -> Result<Option<User>> {
        self.read(|conn| Ok(users::find(conn, id)?))
    }

    /// Look up a verified user. The address is folded the way challenges
    /// store it: spaces removed, lowercased.
    pub fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = fold_email(email);
        self.read(|conn| Ok(users::by_email(conn, &email)?))
    }

    /// The address an unverified user last claimed, if any.
    pub fn pending_email(&self, user: &User) -> Result<Option<String>> {
        if user.is_verified() {
            return Ok(None);
        }
        self.read(|conn| Ok(challenges::claimed_email(conn, user.id)?))
    }

    pub fn identity_state(&self, user: &User) -> Result<IdentityState> {
        if let Some(email) = &user.email {
            return Ok(IdentityState::Verified {
                email: email.clone(),
            });
        }
        Ok(match self.pending_email(user)? {
            Some(email) => IdentityState::Pending { email },
            None => IdentityState::Anonymous,
        })
    }

    /// The reusable login link of a verified user, if one is still active.
    pub fn login_reminder(&self, user: &User) -> Result<Option<String>> {
        let Some(email) = &user.email else {
            return Ok(None);
        };
        let token = self.read(|conn| Ok(challenges::active_token_for_email(conn, email)?))?;
        Ok(token.map(|t| challenge_link(&self.config.base_url, &t)))
    }

    /// Invite someone to follow `lists`, on behalf of `inviter`.
    ///
    /// The invitee gets a pending account already following the lists and a
    /// challenge link; resolving it folds the follows into their real
    /// account when they have one.
    pub fn invite_friend(
        &self,
        inviter_name: &str,
        inviter: &User,
        lists: &[Wishlist],
        raw_email: &str,
        personal_message: &str,
    ) -> Result<()> {
        let Some(inviter_email) = inviter.email.as_deref() else {
            return Err(ServiceError::Permission(
                "only verified users can send invitations".into(),
            ));
        };
        let email = validated_email(raw_email)?;
        let now = self.now();
        let token = token::generate();

        let invitee = self.write(|tx| {
            let invitee = users::insert_anonymous(tx, now)?;
            challenges::insert(tx, &token, &email, invitee, now)?;
            for list in lists {
                friends::insert_if_missing(tx, list.id, invitee, now)?;
            }
            Ok(invitee)
        })?;
        info!(inviter = inviter.id, invitee, lists = lists.len(), "invitation created");

        let names: Vec<String> = lists.iter().map(|l| l.name.clone()).collect();
        let link = challenge_link(&self.config.base_url, &token);
        let message = messages::invitation(inviter_name, &names, &link, personal_message);
        self.deliver(Envelope {
            from: format!("{inviter_name} <{inviter_email}>"),
            reply_to: Some(inviter_email.to_string()),
            to: email,
            subject: message.subject,
            body: message.body,
        });
        Ok(())
    }
}

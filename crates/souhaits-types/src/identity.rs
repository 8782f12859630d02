//! Users and their verification state.

use serde::{Deserialize, Serialize};

use crate::UserId;

/// A user record, verified or not.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Lowercase, confirmed email. `None` until a challenge resolves.
    pub email: Option<String>,
}

impl User {
    /// True once the user has proven ownership of an email address.
    pub fn is_verified(&self) -> bool {
        self.email.is_some()
    }
}

/// Where a user stands in the verification flow.
///
/// `Anonymous -> Pending -> Verified`. Verified is terminal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum IdentityState {
    /// Nothing is known about the user.
    Anonymous,
    /// The user claimed an email but has not answered the challenge yet.
    Pending { email: String },
    /// The user owns `email`.
    Verified { email: String },
}

impl IdentityState {
    /// The email attached to this state, claimed or confirmed.
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Pending { email } | Self::Verified { email } => Some(email),
        }
    }
}

//! Integration test crate for the wishlist service.
//!
//! Fixtures shared by the scenarios under `tests/`. Everything runs against
//! the library crates directly; no daemon process is involved.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p souhaits-integration-tests
//! ```

use std::path::Path;
use std::sync::Arc;

use souhaits_core::{Envelope, ManualClock, MemoryOutbox, Service, ServiceConfig};
use souhaits_types::User;

/// Simulated start time for deterministic tests.
pub const TEST_TIMESTAMP: u64 = 1_700_000_000;

/// A service wired to an in-memory outbox and a manual clock.
pub struct Harness {
    pub service: Service,
    pub outbox: Arc<MemoryOutbox>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    /// Fresh in-memory database.
    pub fn new() -> Self {
        let conn = souhaits_db::open_memory().expect("open in-memory db");
        Self::with_connection(conn, Arc::new(ManualClock::new(TEST_TIMESTAMP)))
    }

    /// A service on the database file at `path`, sharing `clock`.
    pub fn on_file(path: &Path, clock: Arc<ManualClock>) -> Self {
        let conn = souhaits_db::open(path).expect("open db file");
        Self::with_connection(conn, clock)
    }

    fn with_connection(conn: souhaits_db::rusqlite::Connection, clock: Arc<ManualClock>) -> Self {
        let outbox = Arc::new(MemoryOutbox::new());
        let service = Service::new(conn, ServiceConfig::default(), outbox.clone())
            .with_clock(clock.clone());
        Self {
            service,
            outbox,
            clock,
        }
    }

    /// Anonymous session, challenge, resolution: a verified user for `email`.
    pub fn sign_up(&self, email: &str) -> (User, String) {
        let (user, session) = self
            .service
            .create_anonymous_session()
            .expect("anonymous session");
        self.service
            .issue_challenge(&user, email)
            .expect("issue challenge");
        let token = challenge_token(&self.last_mail_to(email));
        let verified = self
            .service
            .resolve_challenge(&token, Some(session.as_str()))
            .expect("resolve challenge");
        (verified, session)
    }

    /// The most recent message sent to `to`.
    pub fn last_mail_to(&self, to: &str) -> Envelope {
        self.outbox
            .sent_to(to)
            .pop()
            .expect("a message to the recipient")
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the challenge token from a message carrying a challenge link.
pub fn challenge_token(envelope: &Envelope) -> String {
    envelope
        .body
        .split("/challenge/")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .expect("challenge link in message body")
        .to_string()
}

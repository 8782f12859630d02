//! # souhaits-core
//!
//! Service layer of the wishlist site: identity and sessions, wishlists and
//! their items, reservations, and garbage collection.
//!
//! A [`Service`] owns one SQLite connection. Every mutating operation runs in
//! its own `IMMEDIATE` transaction so that several services (or processes)
//! sharing a database file serialize their writes. Notifications go out
//! after the transaction commits and never roll it back.

pub mod clock;
pub mod email;
pub mod error;
pub mod gc;
pub mod identity;
pub mod items;
pub mod messages;
pub mod notify;
pub mod reservations;
pub mod slug;
pub mod token;
pub mod wishlists;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use souhaits_db::queries::gc::Retention;
use souhaits_db::rusqlite::{Connection, TransactionBehavior};
use souhaits_types::{ThemeRegistry, Timestamp};

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, ServiceError};
pub use items::ItemEdit;
pub use messages::Message;
pub use notify::{Envelope, MailboxFile, MemoryOutbox, Notifier, NotifyError};
pub use slug::Transliteration;
pub use wishlists::{UpdateOutcome, WishlistUpdate};

/// Site-wide settings used when composing notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Public root of the site, without a trailing slash.
    pub base_url: String,
    pub admin_email: String,
    pub admin_name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7707".to_string(),
            admin_email: "webmaster@mes-souhaits.net".to_string(),
            admin_name: "Mes souhaits".to_string(),
        }
    }
}

/// The wishlist service.
pub struct Service {
    conn: Mutex<Connection>,
    config: ServiceConfig,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    themes: ThemeRegistry,
    slugs: Transliteration,
    retention: Retention,
}

impl Service {
    /// Wrap an already migrated connection.
    pub fn new(conn: Connection, config: ServiceConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            conn: Mutex::new(conn),
            config,
            notifier,
            clock: Arc::new(SystemClock),
            themes: ThemeRegistry::default(),
            slugs: Transliteration::default(),
            retention: Retention::default(),
        }
    }

    /// Open (and migrate) the database at `path`.
    pub fn open(path: &Path, config: ServiceConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let conn = souhaits_db::open(path)?;
        Ok(Self::new(conn, config, notifier))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_themes(mut self, themes: ThemeRegistry) -> Self {
        self.themes = themes;
        self
    }

    pub fn with_transliteration(mut self, slugs: Transliteration) -> Self {
        self.slugs = slugs;
        self
    }

    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn themes(&self) -> &ThemeRegistry {
        &self.themes
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the connection outside any explicit transaction.
    fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock();
        f(&*conn)
    }

    /// Run `f` in an IMMEDIATE transaction, committing on success.
    /// Returning an error drops the transaction, which rolls it back.
    fn write<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&*tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn site_sender(&self) -> String {
        format!("{} <{}>", self.config.admin_name, self.config.admin_email)
    }

    /// Send `message` from the site to `to`. Failures are logged and dropped.
    fn notify(&self, to: &str, message: Message) {
        self.deliver(Envelope {
            from: self.site_sender(),
            reply_to: None,
            to: to.to_string(),
            subject: message.subject,
            body: message.body,
        });
    }

    fn deliver(&self, envelope: Envelope) {
        match self.notifier.send(&envelope) {
            Ok(()) => tracing::debug!(to = %envelope.to, subject = %envelope.subject, "notification sent"),
            Err(err) => tracing::warn!(to = %envelope.to, error = %err, "notification failed"),
        }
    }
}

//! Outgoing notifications.
//!
//! The service composes [`Envelope`]s and hands them to a [`Notifier`].
//! Delivery is best-effort: a failed send is logged by the caller and never
//! undoes the mutation that triggered it.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Notification delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The transport refused or failed to deliver the message.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fully composed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Display form, `Name <address>`.
    pub from: String,
    /// Set when the message is sent on behalf of a user.
    pub reply_to: Option<String>,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers envelopes.
pub trait Notifier: Send + Sync {
    fn send(&self, envelope: &Envelope) -> Result<(), NotifyError>;
}

/// Records every envelope in memory.
#[derive(Debug, Default)]
pub struct MemoryOutbox {
    sent: Mutex<Vec<Envelope>>,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything sent so far.
    pub fn sent(&self) -> Vec<Envelope> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Envelopes addressed to `to`.
    pub fn sent_to(&self, to: &str) -> Vec<Envelope> {
        self.sent().into_iter().filter(|e| e.to == to).collect()
    }

    pub fn len(&self) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain the outbox.
    pub fn take(&self) -> Vec<Envelope> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for MemoryOutbox {
    fn send(&self, envelope: &Envelope) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(envelope.clone());
        Ok(())
    }
}

/// Appends each message to a local mbox-style file instead of sending it.
#[derive(Debug)]
pub struct MailboxFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl MailboxFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn bare_address(from: &str) -> &str {
    match (from.rfind('<'), from.rfind('>')) {
        (Some(start), Some(end)) if start < end => &from[start + 1..end],
        _ => from,
    }
}

/// Header values are single-line; user text may carry line breaks.
fn header_value(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

impl Notifier for MailboxFile {
    fn send(&self, envelope: &Envelope) -> Result<(), NotifyError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let from = header_value(&envelope.from);
        let mut record = format!("From {}\n", bare_address(&from));
        record.push_str(&format!("From: {from}\n"));
        if let Some(reply_to) = &envelope.reply_to {
            record.push_str(&format!("Reply-To: {}\n", header_value(reply_to)));
        }
        record.push_str(&format!("To: {}\n", header_value(&envelope.to)));
        record.push_str(&format!("Subject: {}\n\n", header_value(&envelope.subject)));
        for line in envelope.body.lines() {
            // mbox quoting
            if line.starts_with("From ") {
                record.push('>');
            }
            record.push_str(line);
            record.push('\n');
        }
        record.push('\n');

        file.write_all(record.as_bytes())?;
        tracing::debug!(to = %envelope.to, path = %self.path.display(), "message appended to mailbox");
        Ok(())
    }
}

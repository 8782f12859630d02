//! Garbage collection sweep.
//!
//! One transaction removes everything that has outlived its retention window:
//!
//! 1. sessions idle for longer than `session_idle_days`
//! 2. unverified users older than `unverified_user_days` (with all they own)
//! 3. inactive challenges older than `inactive_challenge_days`
//! 4. items whose donation was confirmed more than `donated_item_days` ago
//!
//! Either all four steps commit or none does.

use rusqlite::Connection;
use souhaits_types::{Timestamp, DAY_SECS};

use crate::Result;

/// Retention windows, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    pub session_idle_days: u64,
    pub unverified_user_days: u64,
    pub inactive_challenge_days: u64,
    pub donated_item_days: u64,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            session_idle_days: 180,
            unverified_user_days: 7,
            inactive_challenge_days: 7,
            donated_item_days: 30,
        }
    }
}

/// Rows removed by one sweep. Counts exclude rows removed by cascades.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub sessions: usize,
    pub users: usize,
    pub challenges: usize,
    pub items: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.sessions + self.users + self.challenges + self.items
    }
}

fn cutoff(now: Timestamp, days: u64) -> i64 {
    now.saturating_sub(days.saturating_mul(DAY_SECS)) as i64
}

/// Run one sweep at time `now`, atomically.
pub fn sweep(conn: &mut Connection, now: Timestamp, retention: &Retention) -> Result<SweepReport> {
    let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

    let sessions = tx.execute(
        "DELETE FROM session WHERE activity_at < ?1",
        [cutoff(now, retention.session_idle_days)],
    )?;

    let users = tx.execute(
        "DELETE FROM user WHERE email IS NULL AND created_at < ?1",
        [cutoff(now, retention.unverified_user_days)],
    )?;

    let challenges = tx.execute(
        "DELETE FROM challenge WHERE active = 0 AND created_at < ?1",
        [cutoff(now, retention.inactive_challenge_days)],
    )?;

    let donated_cutoff = cutoff(now, retention.donated_item_days);
    tx.execute(
        "UPDATE wishlist SET modified_at = ?1 WHERE id IN (
             SELECT i.list FROM item i JOIN reservation r ON r.item = i.id
             WHERE r.status = 'D' AND r.confirmed_at < ?2
         )",
        rusqlite::params![now as i64, donated_cutoff],
    )?;
    let items = tx.execute(
        "DELETE FROM item WHERE id IN (
             SELECT r.item FROM reservation r WHERE r.status = 'D' AND r.confirmed_at < ?1
         )",
        [donated_cutoff],
    )?;

    tx.commit()?;

    Ok(SweepReport {
        sessions,
        users,
        challenges,
        items,
    })
}

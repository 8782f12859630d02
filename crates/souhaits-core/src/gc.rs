//! Periodic cleanup.

use souhaits_db::queries::gc::{self, SweepReport};
use tracing::info;

use crate::{Result, Service};

impl Service {
    /// Run one garbage-collection sweep at the current time.
    pub fn collect_garbage(&self) -> Result<SweepReport> {
        let now = self.now();
        let report = {
            let mut conn = self.lock();
            gc::sweep(&mut *conn, now, &self.retention)?
        };
        info!(
            sessions = report.sessions,
            users = report.users,
            challenges = report.challenges,
            items = report.items,
            "garbage collection sweep"
        );
        Ok(report)
    }
}

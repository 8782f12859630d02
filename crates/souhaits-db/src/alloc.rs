//! Collision-avoiding key allocation.
//!
//! Uniqueness is arbitrated by the store: try to write a candidate, and if a
//! UNIQUE / PRIMARY KEY constraint rejects it, move on to the next one.

use crate::{is_unique_violation, DbError, Result};

/// Try `attempt` with successive candidates until one is accepted.
///
/// A uniqueness violation moves on to the next candidate; any other error is
/// returned as-is. At most `max_attempts` candidates are tried, after which
/// the allocation fails with [`DbError::Exhausted`]. Returns the accepted
/// candidate along with whatever `attempt` produced for it.
pub fn insert_unique<C, T, I, F>(candidates: I, max_attempts: usize, mut attempt: F) -> Result<(C, T)>
where
    I: IntoIterator<Item = C>,
    F: FnMut(&C) -> Result<T>,
{
    let mut tried = 0usize;
    for candidate in candidates.into_iter().take(max_attempts) {
        tried += 1;
        match attempt(&candidate) {
            Ok(value) => return Ok((candidate, value)),
            Err(DbError::Sqlite(e)) if is_unique_violation(&e) => {
                tracing::debug!(attempt = tried, "uniqueness conflict, trying next candidate");
            }
            Err(e) => return Err(e),
        }
    }
    Err(DbError::Exhausted(format!(
        "no free key after {tried} attempts"
    )))
}

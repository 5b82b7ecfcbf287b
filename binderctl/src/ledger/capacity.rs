//! Deck capacity validation.

use super::errors::{LedgerError, Result};

/// Check that adding `attempted` units to a deck currently holding `current` stays within
/// `limit`. A missing limit means the deck is unlimited.
pub fn check_capacity(limit: Option<i32>, current: i64, attempted: i64) -> Result<()> {
    match limit {
        Some(limit) if current + attempted > i64::from(limit) => Err(LedgerError::CapacityExceeded {
            current,
            limit: i64::from(limit),
            attempted,
        }),
        _ => Ok(()),
    }
}

//! Binder ledger: a user's unallocated copies of each card.

use super::errors::{Entity, LedgerError, Result};
use super::store::UnitOfWork;
use crate::db::models::binder::BinderEntry;
use crate::types::{CardId, UserId, abbrev_uuid};
use tracing::instrument;

/// Reject zero and negative quantities before anything is read
pub(crate) fn ensure_positive(quantity: i32) -> Result<()> {
    if quantity <= 0 {
        return Err(LedgerError::invalid(format!("Quantity must be positive, got {quantity}")));
    }
    Ok(())
}

/// Binder operations scoped to one unit of work
pub struct BinderLedger<'u> {
    uow: &'u mut dyn UnitOfWork,
}

impl<'u> BinderLedger<'u> {
    pub fn new(uow: &'u mut dyn UnitOfWork) -> Self {
        Self { uow }
    }

    /// Add copies to a user's binder, creating the entry on first credit
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), card_id = %abbrev_uuid(&card_id)), err)]
    pub async fn credit(&mut self, user_id: UserId, card_id: CardId, quantity: i32) -> Result<BinderEntry> {
        ensure_positive(quantity)?;

        if !self.uow.user_exists(user_id).await? {
            return Err(LedgerError::not_found(Entity::User, user_id));
        }
        if !self.uow.card_exists(card_id).await? {
            return Err(LedgerError::not_found(Entity::Card, card_id));
        }

        let current = self.uow.lock_binder_entry(user_id, card_id).await?.map_or(0, |e| e.quantity);
        if current.checked_add(quantity).is_none() {
            return Err(LedgerError::invalid(format!(
                "Holding of {current} cannot grow by {quantity}"
            )));
        }

        Ok(self.uow.add_binder_quantity(user_id, card_id, quantity).await?)
    }

    /// Remove copies from a user's binder. Returns the remaining entry, or `None` when the
    /// holding was exactly depleted and the entry deleted.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), card_id = %abbrev_uuid(&card_id)), err)]
    pub async fn debit(&mut self, user_id: UserId, card_id: CardId, quantity: i32) -> Result<Option<BinderEntry>> {
        ensure_positive(quantity)?;

        let entry = self
            .uow
            .lock_binder_entry(user_id, card_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(Entity::BinderEntry, format!("{user_id}/{card_id}")))?;

        if quantity > entry.quantity {
            return Err(LedgerError::InsufficientQuantity {
                have: i64::from(entry.quantity),
                want: i64::from(quantity),
            });
        }

        if quantity == entry.quantity {
            self.uow.delete_binder_entry(user_id, card_id).await?;
            return Ok(None);
        }

        let remaining = self.uow.set_binder_quantity(user_id, card_id, entry.quantity - quantity).await?;
        Ok(Some(remaining))
    }

    /// Current unallocated quantity; 0 when there is no entry
    pub async fn quantity_of(&mut self, user_id: UserId, card_id: CardId) -> Result<i64> {
        let entry = self.uow.lock_binder_entry(user_id, card_id).await?;
        Ok(entry.map_or(0, |e| i64::from(e.quantity)))
    }
}

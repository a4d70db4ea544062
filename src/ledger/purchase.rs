//! The purchase transaction: resolve, debit, credit.
//!
//! Debit and credit are two separate atomic record writes, debit first. A
//! crash between them leaves a debited-but-uncredited state; that window is
//! an accepted failure mode and is not papered over with a compensating
//! write. Callers seeing a storage error must tell the user to retry without
//! assuming the purchase was a no-op.

use log::{debug, info};

use crate::catalog::{Catalog, CreditTarget};
use crate::ledger::errors::LedgerError;
use crate::ledger::storage::LedgerStore;
use crate::ledger::types::PurchaseReceipt;
use crate::logutil::escape_log;

/// Buy `quantity` of the item named by `raw_item_name` for `user_id`.
///
/// Non-positive quantities clamp to 1. The original bot treated any invalid
/// amount as "buy one" and users rely on it; tightening the validation here
/// would change observable behavior.
pub fn purchase(
    store: &LedgerStore,
    catalog: &Catalog,
    user_id: &str,
    raw_item_name: &str,
    quantity: i64,
) -> Result<PurchaseReceipt, LedgerError> {
    let quantity = quantity.max(1) as u64;

    let entry = catalog
        .resolve(raw_item_name)
        .ok_or_else(|| LedgerError::ItemNotFound(raw_item_name.trim().to_string()))?
        .clone();

    let total = entry
        .unit_price
        .checked_mul(quantity as i64)
        .ok_or_else(|| {
            LedgerError::InvalidQuantity(format!(
                "{} x {} overflows the berry range",
                entry.unit_price, quantity
            ))
        })?;

    debug!(
        "purchase: user={} item={} -> {} qty={} total={}",
        user_id,
        escape_log(raw_item_name),
        entry.key,
        quantity,
        total
    );

    // Debit first. The closure aborts before any write when the balance
    // cannot cover the total, so a failed purchase mutates nothing.
    let balance = store.update_balance(user_id, |bal| {
        if bal.amount < total {
            return Err(LedgerError::InsufficientFunds {
                required: total,
                available: bal.amount,
            });
        }
        bal.amount -= total;
        Ok(())
    })?;

    // Credit second, onto whichever shape this entry resolved to at
    // catalog-build time.
    match &entry.target {
        CreditTarget::Chest(tier) => {
            let tier = *tier;
            store.update_inventory(user_id, |inv| {
                *inv.chests.entry(tier).or_insert(0) += quantity;
                Ok(())
            })?;
        }
        CreditTarget::XpBooks => {
            store.update_inventory(user_id, |inv| {
                inv.xp_books += quantity;
                Ok(())
            })?;
        }
        CreditTarget::XpScrolls => {
            store.update_inventory(user_id, |inv| {
                inv.xp_scrolls += quantity;
                Ok(())
            })?;
        }
        CreditTarget::ResetTokens => {
            // Lands back on the balance record, not the inventory.
            store.update_balance(user_id, |bal| {
                bal.reset_tokens += quantity as i64;
                Ok(())
            })?;
        }
        CreditTarget::Item(key) => {
            let key = key.clone();
            store.update_inventory(user_id, |inv| {
                *inv.items.entry(key.clone()).or_insert(0) += quantity;
                Ok(())
            })?;
        }
    }

    info!(
        "purchase: user={} bought {} x {} for {}¥ ({}¥ left)",
        user_id, quantity, entry.key, total, balance.amount
    );

    Ok(PurchaseReceipt {
        entry,
        quantity,
        total,
        remaining: balance.amount,
    })
}

//! Ledger core: persisted per-user records and the two operations that
//! mutate them (purchases and pull draws).
//!
//! Records live in sled, one tree per kind, each mutated through a
//! compare-and-swap cycle so concurrent same-user requests serialize per
//! record. Purchases debit the balance before crediting the inventory; see
//! [`purchase`] for the accepted crash-window semantics.

pub mod errors;
pub mod pulls;
pub mod purchase;
pub mod storage;
pub mod types;

pub use errors::LedgerError;
pub use pulls::try_draw;
pub use purchase::purchase;
pub use storage::{LedgerStore, LedgerStoreBuilder};
pub use types::{
    BalanceRecord, DrawReceipt, InventoryRecord, PullRecord, PurchaseReceipt,
    BALANCE_SCHEMA_VERSION, INVENTORY_SCHEMA_VERSION, PULL_SCHEMA_VERSION,
};

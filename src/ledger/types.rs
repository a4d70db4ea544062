//! Persisted ledger records and operation receipts.
//!
//! Each record kind carries a schema version that is checked on read, and an
//! `updated_at` touch timestamp. Records are created lazily with zero
//! defaults on first use and never deleted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogEntry, ChestTier};

pub const BALANCE_SCHEMA_VERSION: u8 = 1;
pub const INVENTORY_SCHEMA_VERSION: u8 = 1;
pub const PULL_SCHEMA_VERSION: u8 = 1;

/// Per-user spendable currency plus derived currency counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub user_id: String,
    /// Spendable berries. Never negative; a debit that would underflow is
    /// rejected before it is applied.
    pub amount: i64,
    /// Derived currency credited by reset-token purchases.
    #[serde(default)]
    pub reset_tokens: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl BalanceRecord {
    pub fn new(user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            amount: 0,
            reset_tokens: 0,
            created_at: now,
            updated_at: now,
            schema_version: BALANCE_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Per-user owned quantities: chest tiers, two dedicated counters, and a
/// generic item map for everything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub user_id: String,
    /// Chest counts per tier. Absent tiers read as zero.
    #[serde(default)]
    pub chests: BTreeMap<ChestTier, u64>,
    /// Generic bucket keyed by canonical, case-normalized item name.
    #[serde(default)]
    pub items: BTreeMap<String, u64>,
    #[serde(default)]
    pub xp_books: u64,
    #[serde(default)]
    pub xp_scrolls: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl InventoryRecord {
    pub fn new(user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            chests: BTreeMap::new(),
            items: BTreeMap::new(),
            xp_books: 0,
            xp_scrolls: 0,
            created_at: now,
            updated_at: now,
            schema_version: INVENTORY_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn chest_count(&self, tier: ChestTier) -> u64 {
        self.chests.get(&tier).copied().unwrap_or(0)
    }

    pub fn item_count(&self, key: &str) -> u64 {
        self.items.get(key).copied().unwrap_or(0)
    }
}

/// Per-(user, window) pull bookkeeping. `used` resets implicitly because each
/// window gets its own record; `total_pulls` is the lifetime counter carried
/// forward from the previous window's record so pity progress survives the
/// window rollover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRecord {
    pub user_id: String,
    pub window: u64,
    pub used: u32,
    pub total_pulls: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl PullRecord {
    /// Fresh record for a window, seeded with the lifetime counter carried
    /// over from the most recent prior window (0 for a first-ever draw).
    pub fn new(user_id: &str, window: u64, carried_total: u64) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            window,
            used: 0,
            total_pulls: carried_total,
            created_at: now,
            updated_at: now,
            schema_version: PULL_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Successful purchase outcome.
#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    pub entry: CatalogEntry,
    pub quantity: u64,
    /// Berries debited (`unit_price * quantity`).
    pub total: i64,
    /// Balance remaining after the debit.
    pub remaining: i64,
}

/// Successful draw outcome. `total_pulls_after` feeds external pity logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawReceipt {
    pub used_after: u32,
    pub total_pulls_after: u64,
}

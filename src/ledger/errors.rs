use thiserror::Error;

/// Errors that can arise while interacting with the ledger core.
///
/// Business failures (`ItemNotFound`, `InsufficientFunds`, `QuotaExceeded`)
/// carry the structured data a caller needs to render a precise message; they
/// are ordinary outcomes, never internal control flow. Storage failures wrap
/// the underlying sled/bincode/io error and may leave a purchase half-applied
/// (debited but uncredited) — callers must report "try again" without
/// assuming idempotence.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The free-text item name matched nothing in the catalog.
    #[error("item not found: {0}")]
    ItemNotFound(String),

    /// Balance cannot cover the purchase total.
    #[error("insufficient funds: need {required}¥, have {available}¥")]
    InsufficientFunds { required: i64, available: i64 },

    /// The per-window pull quota is already exhausted.
    #[error("pull quota exceeded: {capacity} per window")]
    QuotaExceeded { capacity: u32 },

    /// Quantity arithmetic left the 64-bit range.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },
}

impl LedgerError {
    /// True for failures the end user caused (bad item, empty wallet, spent
    /// quota) rather than storage trouble.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            LedgerError::ItemNotFound(_)
                | LedgerError::InsufficientFunds { .. }
                | LedgerError::QuotaExceeded { .. }
                | LedgerError::InvalidQuantity(_)
        )
    }
}

//! Ledger error model.

use thiserror::Error;

/// Result type used across the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Outcome of a rejected ledger operation.
///
/// `NotFound`, `InvalidInput` and `LimitExceeded` are deterministic business
/// outcomes; retrying them yields the same answer. `Transient` covers storage
/// failures, where the operation left no trace and the caller may retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The account id does not name a provisioned account.
    #[error("account not found")]
    NotFound,

    /// The request cannot be processed (bad kind, amount or description).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A debit would take the balance below `-limit`.
    #[error("insufficient available credit: balance {balance}, limit {limit}, debit {amount}")]
    LimitExceeded { balance: i64, limit: i64, amount: i64 },

    /// The backing store failed; nothing was applied.
    #[error("storage failure: {0}")]
    Transient(String),
}

impl LedgerError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Whether the caller may retry the same request and expect a different outcome.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

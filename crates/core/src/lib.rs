//! `creditline-core` — shared building blocks for the credit ledger.
//!
//! Identifiers and the error taxonomy only (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{LedgerError, LedgerResult};
pub use id::{AccountId, TransactionId};

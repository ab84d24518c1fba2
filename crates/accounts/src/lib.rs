//! Credit accounts (balance against a fixed credit limit).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod account;
pub mod transaction;

pub use account::{Account, AccountSeed, Balance, Statement, RECENT_TRANSACTIONS};
pub use transaction::{
    Amount, Description, NewTransaction, Transaction, TransactionKind, MAX_DESCRIPTION_CHARS,
};

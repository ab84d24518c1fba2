//! Account storage abstraction.
//!
//! A store owns account state and the append-only transaction log, and is the
//! unit of concurrency control: [`AccountStore::apply`] must run the
//! check-then-write of one account atomically with respect to every other
//! `apply` on the same account, without blocking other accounts.

use std::sync::Arc;

use async_trait::async_trait;

use creditline_accounts::{AccountSeed, Balance, NewTransaction, Statement};
use creditline_core::{AccountId, LedgerResult};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryAccountStore;
pub use postgres::PostgresAccountStore;

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Apply a validated transaction to an account.
    ///
    /// On success the balance update and the new ledger entry are both
    /// visible; on any error neither is.
    async fn apply(&self, account_id: AccountId, tx: NewTransaction) -> LedgerResult<Balance>;

    /// Consistent snapshot of an account plus its `recent` newest entries.
    async fn statement(&self, account_id: AccountId, recent: usize) -> LedgerResult<Statement>;

    /// Provision accounts when the store holds none yet, skipping ids that
    /// already exist. Returns how many accounts were created.
    async fn provision(&self, seeds: &[AccountSeed]) -> LedgerResult<usize>;
}

#[async_trait]
impl<S> AccountStore for Arc<S>
where
    S: AccountStore + ?Sized,
{
    async fn apply(&self, account_id: AccountId, tx: NewTransaction) -> LedgerResult<Balance> {
        (**self).apply(account_id, tx).await
    }

    async fn statement(&self, account_id: AccountId, recent: usize) -> LedgerResult<Statement> {
        (**self).statement(account_id, recent).await
    }

    async fn provision(&self, seeds: &[AccountSeed]) -> LedgerResult<usize> {
        (**self).provision(seeds).await
    }
}

//! Account ledger service: validation in front of an [`AccountStore`].

use tracing::instrument;

use creditline_accounts::{AccountSeed, Balance, NewTransaction, Statement, RECENT_TRANSACTIONS};
use creditline_core::{AccountId, LedgerError, LedgerResult};

use crate::store::AccountStore;

/// Entry point for the two ledger operations.
///
/// Submissions are validated here, before the store is touched, so invalid
/// input never takes a lock or opens a database transaction.
#[derive(Debug, Clone)]
pub struct AccountLedger<S> {
    store: S,
}

impl<S> AccountLedger<S>
where
    S: AccountStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Submit a credit (`"c"`) or debit (`"d"`) against an account.
    #[instrument(skip(self, description), fields(account_id = %account_id))]
    pub async fn submit(
        &self,
        account_id: AccountId,
        amount: i64,
        kind: &str,
        description: &str,
    ) -> LedgerResult<Balance> {
        let tx = NewTransaction::new(amount, kind, description)?;
        let result = self.store.apply(account_id, tx).await;

        match &result {
            Ok(b) => tracing::debug!(balance = b.balance, limit = b.limit, "transaction accepted"),
            Err(LedgerError::Transient(msg)) => tracing::error!(%msg, "transaction failed"),
            Err(e) => tracing::debug!(error = %e, "transaction rejected"),
        }

        result
    }

    /// Current balance and the latest entries, newest first.
    pub async fn statement(&self, account_id: AccountId) -> LedgerResult<Statement> {
        self.store.statement(account_id, RECENT_TRANSACTIONS).await
    }

    /// Seed the store on first start.
    pub async fn provision(&self, seeds: &[AccountSeed]) -> LedgerResult<usize> {
        self.store.provision(seeds).await
    }
}

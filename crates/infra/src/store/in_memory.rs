use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use creditline_accounts::{Account, AccountSeed, Balance, NewTransaction, Statement, Transaction};
use creditline_core::{AccountId, LedgerError, LedgerResult};

use super::AccountStore;

/// One account plus its ledger, guarded together by the account's mutex.
#[derive(Debug)]
struct AccountState {
    account: Account,
    /// Append-only, oldest first.
    entries: Vec<Transaction>,
}

/// In-process account store with a per-account lock table.
///
/// The outer map is write-locked only while provisioning; afterwards every
/// operation takes a read lock just long enough to clone the account's
/// `Arc<Mutex<_>>`, then works under that account's mutex alone. Submissions
/// on one account therefore serialize while other accounts proceed in
/// parallel. State lives as long as the store; there is no teardown.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<AccountId, Arc<Mutex<AccountState>>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, account_id: AccountId) -> LedgerResult<Arc<Mutex<AccountState>>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| LedgerError::transient("account table lock poisoned"))?;
        accounts.get(&account_id).cloned().ok_or(LedgerError::NotFound)
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    #[instrument(skip(self, tx), fields(account_id = %account_id, kind = %tx.kind), err(level = "debug"))]
    async fn apply(&self, account_id: AccountId, tx: NewTransaction) -> LedgerResult<Balance> {
        let cell = self.cell(account_id)?;
        let mut state = cell
            .lock()
            .map_err(|_| LedgerError::transient(format!("account {account_id} lock poisoned")))?;

        let balance = state.account.apply(&tx)?;
        state.entries.push(Transaction::accept(account_id, tx, Utc::now()));
        Ok(balance)
    }

    #[instrument(skip(self), fields(account_id = %account_id), err(level = "debug"))]
    async fn statement(&self, account_id: AccountId, recent: usize) -> LedgerResult<Statement> {
        let cell = self.cell(account_id)?;
        let state = cell
            .lock()
            .map_err(|_| LedgerError::transient(format!("account {account_id} lock poisoned")))?;

        Ok(Statement {
            account_id,
            limit: state.account.limit(),
            balance: state.account.balance(),
            as_of: Utc::now(),
            recent_transactions: state.entries.iter().rev().take(recent).cloned().collect(),
        })
    }

    async fn provision(&self, seeds: &[AccountSeed]) -> LedgerResult<usize> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| LedgerError::transient("account table lock poisoned"))?;

        if !accounts.is_empty() {
            return Ok(0);
        }

        let mut created = 0;
        for seed in seeds {
            if accounts.contains_key(&seed.id) {
                continue;
            }
            let account = Account::provision(*seed)?;
            accounts.insert(
                seed.id,
                Arc::new(Mutex::new(AccountState {
                    account,
                    entries: Vec::new(),
                })),
            );
            created += 1;
        }

        tracing::info!(created, "provisioned in-memory accounts");
        Ok(created)
    }
}

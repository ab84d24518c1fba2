use std::sync::Arc;

use anyhow::Context;

use creditline_accounts::{AccountSeed, Balance, Statement};
use creditline_core::{AccountId, LedgerResult};
use creditline_infra::{
    schema, AccountLedger, DatabaseConfig, InMemoryAccountStore, PostgresAccountStore,
};

use crate::config::Config;

/// Ledger wiring, one variant per storage backend.
#[derive(Clone)]
pub enum AppServices {
    InMemory {
        ledger: Arc<AccountLedger<InMemoryAccountStore>>,
    },
    Persistent {
        ledger: Arc<AccountLedger<PostgresAccountStore>>,
    },
}

pub async fn build_services(config: &Config) -> anyhow::Result<AppServices> {
    let seeds = AccountSeed::reference();

    if config.use_persistent_stores {
        let db = config
            .database
            .as_ref()
            .context("USE_PERSISTENT_STORES=true requires database settings")?;
        return AppServices::persistent(db, &seeds).await;
    }

    Ok(AppServices::in_memory(&seeds).await?)
}

impl AppServices {
    /// In-process store (dev/test), provisioned with `seeds`.
    pub async fn in_memory(seeds: &[AccountSeed]) -> LedgerResult<Self> {
        let ledger = AccountLedger::new(InMemoryAccountStore::new());
        ledger.provision(seeds).await?;
        Ok(AppServices::InMemory {
            ledger: Arc::new(ledger),
        })
    }

    /// Postgres store: connect, ensure the schema, seed an empty database.
    pub async fn persistent(db: &DatabaseConfig, seeds: &[AccountSeed]) -> anyhow::Result<Self> {
        let pool = db.connect().await.context("failed to connect to Postgres")?;
        schema::ensure_schema(&pool)
            .await
            .context("failed to apply database schema")?;

        let ledger = AccountLedger::new(PostgresAccountStore::new(pool));
        ledger
            .provision(seeds)
            .await
            .context("failed to seed accounts")?;

        Ok(AppServices::Persistent {
            ledger: Arc::new(ledger),
        })
    }

    pub fn backend(&self) -> &'static str {
        match self {
            AppServices::InMemory { .. } => "in_memory",
            AppServices::Persistent { .. } => "postgres",
        }
    }

    pub async fn submit(
        &self,
        account_id: AccountId,
        amount: i64,
        kind: &str,
        description: &str,
    ) -> LedgerResult<Balance> {
        match self {
            AppServices::InMemory { ledger } => ledger.submit(account_id, amount, kind, description).await,
            AppServices::Persistent { ledger } => {
                ledger.submit(account_id, amount, kind, description).await
            }
        }
    }

    pub async fn statement(&self, account_id: AccountId) -> LedgerResult<Statement> {
        match self {
            AppServices::InMemory { ledger } => ledger.statement(account_id).await,
            AppServices::Persistent { ledger } => ledger.statement(account_id).await,
        }
    }
}

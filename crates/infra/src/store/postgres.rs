//! Postgres-backed account store.
//!
//! ## Concurrency
//!
//! `apply` runs inside one database transaction and locks the account row
//! with `SELECT ... FOR UPDATE` before checking the debit. Concurrent
//! submissions on the same account queue on that row lock; other accounts'
//! rows stay unlocked. The balance update and the ledger insert commit (or
//! roll back) together.
//!
//! `statement` reads the account row and its latest entries inside a
//! `REPEATABLE READ READ ONLY` transaction, so both come from one snapshot
//! without taking any lock.
//!
//! ## Error Mapping
//!
//! Every SQLx error becomes `LedgerError::Transient`: from the caller's point
//! of view the store was unavailable and nothing was applied.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction as PgTransaction};
use tracing::{instrument, Span};

use creditline_accounts::{
    Account, AccountSeed, Amount, Balance, Description, NewTransaction, Statement, Transaction,
    TransactionKind,
};
use creditline_core::{AccountId, LedgerError, LedgerResult, TransactionId};

use super::AccountStore;

/// Account store over a Postgres connection pool.
///
/// `PgPool` is already `Send + Sync`; the store can be shared freely.
#[derive(Debug, Clone)]
pub struct PostgresAccountStore {
    pool: Arc<PgPool>,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    #[instrument(
        skip(self, tx),
        fields(
            account_id = %account_id,
            kind = %tx.kind,
            amount = tx.amount.get(),
            balance = tracing::field::Empty
        ),
        err(level = "debug")
    )]
    async fn apply(&self, account_id: AccountId, tx: NewTransaction) -> LedgerResult<Balance> {
        let mut db = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(
            r#"
            SELECT id, credit_limit, balance
            FROM accounts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(account_id.get())
        .fetch_optional(&mut *db)
        .await
        .map_err(|e| map_sqlx_error("lock_account", e))?;

        let Some(row) = row else {
            rollback(db).await?;
            return Err(LedgerError::NotFound);
        };

        let mut account = account_from_row(&row)?;
        let balance = match account.apply(&tx) {
            Ok(b) => b,
            Err(e) => {
                rollback(db).await?;
                return Err(e);
            }
        };

        let entry = Transaction::accept(account_id, tx, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id,
                account_id,
                amount,
                kind,
                description,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(account_id.get())
        .bind(entry.amount.get())
        .bind(entry.kind.code())
        .bind(entry.description.as_str())
        .bind(entry.created_at)
        .execute(&mut *db)
        .await
        .map_err(|e| map_sqlx_error("insert_transaction", e))?;

        sqlx::query("UPDATE accounts SET balance = $2 WHERE id = $1")
            .bind(account_id.get())
            .bind(balance.balance)
            .execute(&mut *db)
            .await
            .map_err(|e| map_sqlx_error("update_balance", e))?;

        db.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Span::current().record("balance", balance.balance);
        Ok(balance)
    }

    #[instrument(skip(self), fields(account_id = %account_id), err(level = "debug"))]
    async fn statement(&self, account_id: AccountId, recent: usize) -> LedgerResult<Statement> {
        let mut db = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *db)
            .await
            .map_err(|e| map_sqlx_error("set_isolation", e))?;

        let row = sqlx::query("SELECT id, credit_limit, balance FROM accounts WHERE id = $1")
            .bind(account_id.get())
            .fetch_optional(&mut *db)
            .await
            .map_err(|e| map_sqlx_error("load_account", e))?;

        let Some(row) = row else {
            rollback(db).await?;
            return Err(LedgerError::NotFound);
        };
        let account = account_from_row(&row)?;

        let rows = sqlx::query(
            r#"
            SELECT
                id,
                account_id,
                amount,
                kind,
                description,
                created_at
            FROM transactions
            WHERE account_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(account_id.get())
        .bind(i64::try_from(recent).unwrap_or(i64::MAX))
        .fetch_all(&mut *db)
        .await
        .map_err(|e| map_sqlx_error("load_transactions", e))?;

        let as_of = Utc::now();
        db.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        let recent_transactions = rows
            .iter()
            .map(transaction_from_row)
            .collect::<LedgerResult<Vec<_>>>()?;

        Ok(Statement {
            account_id,
            limit: account.limit(),
            balance: account.balance(),
            as_of,
            recent_transactions,
        })
    }

    #[instrument(skip(self, seeds), fields(seeds = seeds.len()), err)]
    async fn provision(&self, seeds: &[AccountSeed]) -> LedgerResult<usize> {
        let mut db = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let existing: i64 = sqlx::query("SELECT COUNT(*) AS total FROM accounts")
            .fetch_one(&mut *db)
            .await
            .map_err(|e| map_sqlx_error("count_accounts", e))?
            .try_get("total")
            .map_err(|e| map_sqlx_error("count_accounts", e))?;

        if existing > 0 {
            rollback(db).await?;
            tracing::info!(existing, "accounts already provisioned; skipping seed");
            return Ok(0);
        }

        let mut created = 0;
        for seed in seeds {
            // Validates the seed before it reaches the table.
            Account::provision(*seed)?;

            let result = sqlx::query(
                r#"
                INSERT INTO accounts (id, credit_limit, balance)
                VALUES ($1, $2, 0)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(seed.id.get())
            .bind(seed.limit)
            .execute(&mut *db)
            .await
            .map_err(|e| map_sqlx_error("insert_account", e))?;
            created += result.rows_affected() as usize;
        }

        db.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(created, "provisioned accounts");
        Ok(created)
    }
}

async fn rollback(db: PgTransaction<'_, Postgres>) -> LedgerResult<()> {
    db.rollback()
        .await
        .map_err(|e| map_sqlx_error("rollback", e))
}

fn account_from_row(row: &sqlx::postgres::PgRow) -> LedgerResult<Account> {
    let id: i32 = row.try_get("id").map_err(|e| map_sqlx_error("read_account", e))?;
    let limit: i64 = row
        .try_get("credit_limit")
        .map_err(|e| map_sqlx_error("read_account", e))?;
    let balance: i64 = row
        .try_get("balance")
        .map_err(|e| map_sqlx_error("read_account", e))?;

    Account::restore(AccountId::new(id), limit, balance)
        .map_err(|e| LedgerError::transient(format!("corrupt account row: {e}")))
}

fn transaction_from_row(row: &sqlx::postgres::PgRow) -> LedgerResult<Transaction> {
    let row = TransactionRow {
        id: row.try_get("id").map_err(|e| map_sqlx_error("read_transaction", e))?,
        account_id: row
            .try_get("account_id")
            .map_err(|e| map_sqlx_error("read_transaction", e))?,
        amount: row
            .try_get("amount")
            .map_err(|e| map_sqlx_error("read_transaction", e))?,
        kind: row
            .try_get("kind")
            .map_err(|e| map_sqlx_error("read_transaction", e))?,
        description: row
            .try_get("description")
            .map_err(|e| map_sqlx_error("read_transaction", e))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| map_sqlx_error("read_transaction", e))?,
    };
    row.try_into()
}

#[derive(Debug)]
struct TransactionRow {
    id: uuid::Uuid,
    account_id: i32,
    amount: i64,
    kind: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = LedgerError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let corrupt = |e: LedgerError| LedgerError::transient(format!("corrupt transaction row: {e}"));
        Ok(Transaction {
            id: TransactionId::from_uuid(row.id),
            account_id: AccountId::new(row.account_id),
            amount: Amount::new(row.amount).map_err(corrupt)?,
            kind: row.kind.parse::<TransactionKind>().map_err(corrupt)?,
            description: Description::new(row.description).map_err(corrupt)?,
            created_at: row.created_at,
        })
    }
}

/// Map SQLx errors to `LedgerError::Transient`, tagged with the operation.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> LedgerError {
    let msg = match err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => format!("database error in {operation} ({code}): {}", db_err.message()),
            None => format!("database error in {operation}: {}", db_err.message()),
        },
        sqlx::Error::PoolClosed => format!("connection pool closed in {operation}"),
        sqlx::Error::PoolTimedOut => format!("connection pool timed out in {operation}"),
        other => format!("sqlx error in {operation}: {other}"),
    };
    tracing::warn!("{msg}");
    LedgerError::Transient(msg)
}

#[cfg(test)]
mod tests {
    //! Run against a scratch database:
    //! `DATABASE_URL=postgres://... cargo test -p creditline-infra -- --ignored`

    use super::*;
    use crate::schema;

    async fn store() -> PostgresAccountStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPool::connect(&url).await.unwrap();
        schema::ensure_schema(&pool).await.unwrap();
        sqlx::query("TRUNCATE transactions, accounts").execute(&pool).await.unwrap();
        PostgresAccountStore::new(pool)
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn debit_over_limit_is_rejected_and_not_recorded() {
        let store = store().await;
        store.provision(&[AccountSeed::new(1, 1000)]).await.unwrap();
        let id = AccountId::new(1);

        let b = store.apply(id, NewTransaction::new(500, "d", "x").unwrap()).await.unwrap();
        assert_eq!(b, Balance { limit: 1000, balance: -500 });

        let err = store
            .apply(id, NewTransaction::new(600, "d", "y").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::LimitExceeded { .. }));

        let st = store.statement(id, 10).await.unwrap();
        assert_eq!(st.balance, -500);
        assert_eq!(st.recent_transactions.len(), 1);
        assert_eq!(st.recent_transactions[0].description.as_str(), "x");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    #[ignore = "requires DATABASE_URL"]
    async fn row_lock_serializes_concurrent_debits() {
        let store = Arc::new(store().await);
        store.provision(&[AccountSeed::new(1, 1000)]).await.unwrap();

        let handles: Vec<_> = (0..30)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .apply(AccountId::new(1), NewTransaction::new(100, "d", "d").unwrap())
                        .await
                })
            })
            .collect();

        let mut accepted = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 10);
        assert_eq!(store.statement(AccountId::new(1), 10).await.unwrap().balance, -1000);
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn seeding_twice_creates_nothing_new() {
        let store = store().await;
        assert_eq!(store.provision(&AccountSeed::reference()).await.unwrap(), 5);
        assert_eq!(store.provision(&AccountSeed::reference()).await.unwrap(), 0);
    }
}

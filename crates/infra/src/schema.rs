//! Relational schema for the Postgres store.
//!
//! Applied at startup with `IF NOT EXISTS`, so running it against an already
//! initialized database is a no-op.

use sqlx::PgPool;

/// DDL statements, in dependency order.
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id           INTEGER PRIMARY KEY,
        credit_limit BIGINT  NOT NULL CHECK (credit_limit >= 0),
        balance      BIGINT  NOT NULL DEFAULT 0,
        CONSTRAINT balance_within_limit CHECK (balance >= -credit_limit)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id          UUID        PRIMARY KEY,
        account_id  INTEGER     NOT NULL REFERENCES accounts (id),
        amount      BIGINT      NOT NULL CHECK (amount > 0),
        kind        CHAR(1)     NOT NULL CHECK (kind IN ('c', 'd')),
        description VARCHAR(10) NOT NULL CHECK (char_length(description) >= 1),
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS transactions_account_recent_idx
        ON transactions (account_id, created_at DESC, id DESC)
    "#,
];

/// Create tables and indexes that do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(*statement).execute(pool).await?;
    }
    tracing::info!(statements = SCHEMA.len(), "database schema ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_columns_match_wire_limits() {
        let transactions = SCHEMA
            .iter()
            .find(|s| s.contains("CREATE TABLE IF NOT EXISTS transactions"))
            .unwrap();
        assert!(transactions.contains("kind        CHAR(1)"));
        assert!(transactions.contains("description VARCHAR(10)"));
    }
}

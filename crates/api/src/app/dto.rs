use serde::Deserialize;

use creditline_accounts::{Balance, Statement, Transaction};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /accounts/{id}/transactions`.
///
/// Fields are only type-checked here; range and vocabulary checks belong to
/// the ledger so they surface as `invalid_input`.
#[derive(Debug, Deserialize)]
pub struct SubmitTransactionRequest {
    pub amount: i64,
    pub kind: String,
    pub description: String,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn balance_to_json(b: Balance) -> serde_json::Value {
    serde_json::json!({
        "limit": b.limit,
        "balance": b.balance,
    })
}

pub fn transaction_to_json(t: &Transaction) -> serde_json::Value {
    serde_json::json!({
        "amount": t.amount.get(),
        "kind": t.kind.code(),
        "description": t.description.as_str(),
        "createdAt": t.created_at.to_rfc3339(),
    })
}

pub fn statement_to_json(st: &Statement) -> serde_json::Value {
    serde_json::json!({
        "balance": {
            "total": st.balance,
            "statementDate": st.as_of.to_rfc3339(),
            "limit": st.limit,
        },
        "recentTransactions": st
            .recent_transactions
            .iter()
            .map(transaction_to_json)
            .collect::<Vec<_>>(),
    })
}

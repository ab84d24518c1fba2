use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use creditline_core::AccountId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/:id/transactions", post(submit_transaction))
        .route("/:id/statement", get(get_statement))
}

pub async fn submit_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::SubmitTransactionRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let account_id: AccountId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::ledger_error_to_response(e),
    };

    match services
        .submit(account_id, body.amount, &body.kind, &body.description)
        .await
    {
        Ok(balance) => (StatusCode::OK, Json(dto::balance_to_json(balance))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_statement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let account_id: AccountId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::ledger_error_to_response(e),
    };

    match services.statement(account_id).await {
        Ok(st) => (StatusCode::OK, Json(dto::statement_to_json(&st))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

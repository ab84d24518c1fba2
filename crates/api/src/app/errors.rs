use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use creditline_core::LedgerError;

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        LedgerError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", message),
        LedgerError::InvalidInput(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_input", message)
        }
        LedgerError::LimitExceeded { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "limit_exceeded", message)
        }
        LedgerError::Transient(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "transient", message)
        }
    }
}

/// Well-formed JSON with the wrong shape is a validation failure; anything
/// that is not JSON at all is a bad request.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    match rejection {
        JsonRejection::JsonDataError(e) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_input", e.body_text())
        }
        other => json_error(StatusCode::BAD_REQUEST, "bad_request", other.body_text()),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

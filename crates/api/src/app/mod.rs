//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and ledger wiring
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{http::HeaderValue, Extension, Router};
use tower::ServiceBuilder;

use crate::config::Config;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router from configuration (public entrypoint used by `main.rs`).
pub async fn build_app(config: &Config) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config).await?);
    tracing::info!(backend = services.backend(), "account ledger ready");
    Ok(router(services, config.server_id.clone()))
}

/// Router over already-built services.
pub fn router(services: Arc<AppServices>, server_id: Option<HeaderValue>) -> Router {
    routes::router().layer(Extension(services)).layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(
                middleware::ServerIdState { server_id },
                middleware::server_id_middleware,
            ))
            .layer(axum::middleware::from_fn(middleware::trace_requests)),
    )
}

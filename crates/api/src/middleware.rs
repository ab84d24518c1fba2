use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

pub static SERVER_ID_HEADER: HeaderName = HeaderName::from_static("x-server-id");

#[derive(Clone)]
pub struct ServerIdState {
    pub server_id: Option<HeaderValue>,
}

/// Tag every response with the instance that served it.
pub async fn server_id_middleware(
    State(state): State<ServerIdState>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let mut res = next.run(req).await;
    if let Some(id) = &state.server_id {
        res.headers_mut().insert(SERVER_ID_HEADER.clone(), id.clone());
    }
    res
}

pub async fn trace_requests(req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();

    let res = next.run(req).await;

    tracing::debug!(
        %method,
        %path,
        status = res.status().as_u16(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "request served"
    );
    res
}

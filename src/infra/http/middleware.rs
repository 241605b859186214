use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

const TARGET: &str = "postboard::http";

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Per-request identifier, echoed back to the caller in `x-request-id`.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

pub async fn assign_request_id(mut request: Request<Body>, next: Next) -> Response {
    let id = RequestId(Uuid::new_v4().to_string());
    request.extensions_mut().insert(id.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id.0) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), value);
    }
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    // Reports are internal only; strip them before the response leaves.
    let report = response.extensions_mut().remove::<ErrorReport>();

    if response.status().is_success() || response.status().is_redirection() {
        debug!(target: TARGET, %method, %path, status, elapsed_ms, %request_id, "request completed");
        return response;
    }

    let (source, chain) = report
        .map(|report| (report.source, report.messages))
        .unwrap_or(("unreported", Vec::new()));

    if response.status().is_server_error() {
        error!(target: TARGET, %method, %path, status, elapsed_ms, %request_id, source, ?chain, "request failed");
    } else {
        warn!(target: TARGET, %method, %path, status, elapsed_ms, %request_id, source, ?chain, "request rejected");
    }
    response
}

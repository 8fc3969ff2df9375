//! Request identification and entry logging.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) as early as possible
//! - Log every request on entry, before any policy stage runs
//!
//! # Design Decisions
//! - The entry log is unconditional: it records requests the policies will
//!   later reject, so the access log is complete

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs for `SetRequestIdLayer`.
#[derive(Clone, Copy, Default)]
pub struct GatewayRequestId;

impl MakeRequestId for GatewayRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = HeaderValue::from_str(&Uuid::new_v4().to_string()).ok()?;
        Some(RequestId::new(id))
    }
}

/// Middleware logging method and URL for every inbound request.
pub async fn log_entry(request: Request<Body>, next: Next) -> Response {
    tracing::info!(
        method = %request.method(),
        url = %request.uri(),
        "Request received"
    );
    next.run(request).await
}

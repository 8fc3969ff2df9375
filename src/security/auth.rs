//! API key authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::http::response::reject;
use crate::observability::metrics;

/// Header carrying the client credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// State required for authentication.
#[derive(Clone)]
pub struct AuthState {
    /// The shared secret, fixed for process lifetime.
    api_key: Arc<str>,
}

impl AuthState {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: Arc::from(api_key),
        }
    }

    /// Exact, case-sensitive comparison against the configured secret.
    fn is_valid(&self, presented: Option<&str>) -> bool {
        presented == Some(self.api_key.as_ref())
    }
}

/// Middleware rejecting requests without a matching `x-api-key` header.
///
/// Runs before the rate limiter: an unauthenticated request must not
/// consume quota.
pub async fn require_api_key(
    State(state): State<AuthState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if state.is_valid(presented) {
        next.run(req).await
    } else {
        tracing::info!("Rejecting request without valid API key");
        metrics::record_rejected("unauthorized");
        reject(StatusCode::UNAUTHORIZED, "Unauthorized")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_required() {
        let state = AuthState::new("secret123");
        assert!(state.is_valid(Some("secret123")));
        assert!(!state.is_valid(Some("Secret123")));
        assert!(!state.is_valid(Some("secret123 ")));
        assert!(!state.is_valid(Some("")));
        assert!(!state.is_valid(None));
    }
}

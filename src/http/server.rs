//! HTTP server setup and request pipeline.
//!
//! # Responsibilities
//! - Create the Axum router with local handlers and the forward fallback
//! - Wire the policy middleware in pipeline order
//! - Forward policed requests to the configured upstream
//! - Reconstruct upstream responses for the client
//! - Serve with graceful shutdown

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{
        uri::{Authority, Scheme},
        Request, StatusCode, Uri,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde_json::json;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::request::{log_entry, GatewayRequestId, X_REQUEST_ID};
use crate::http::response::{reject, UpstreamReply};
use crate::observability::metrics;
use crate::security::auth::{require_api_key, AuthState};
use crate::security::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::store::{CounterStore, RedisCounterStore, StoreError};

/// Errors constructing the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid upstream base URL: {0}")]
    InvalidUpstream(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Application state injected into the forward handler.
#[derive(Clone)]
pub struct AppState {
    pub client: Client<HttpConnector, Body>,
    pub upstream_scheme: Scheme,
    pub upstream_authority: Authority,
}

/// HTTP server for the security gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server backed by the Redis counter store from `config`.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let store = RedisCounterStore::new(&config.counter_store.url())?;
        Self::with_store(config, Arc::new(store))
    }

    /// Create a server with an explicit counter store (used by tests).
    pub fn with_store(
        config: GatewayConfig,
        store: Arc<dyn CounterStore>,
    ) -> Result<Self, ServerError> {
        let limiter = Arc::new(RateLimiter::new(
            store,
            Duration::from_secs(config.rate_limit.window_secs),
            config.rate_limit.max_requests,
            config.rate_limit.on_store_error,
        ));
        let auth = AuthState::new(&config.auth.api_key);

        // Initialize HTTP client for upstream forwarding
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let (upstream_scheme, upstream_authority) = upstream_target(&config.upstream.base_url)?;

        let state = AppState {
            client,
            upstream_scheme,
            upstream_authority,
        };

        let router = Self::build_router(&config, state, auth, limiter);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// `ServiceBuilder` applies layers top-down, which is the pipeline
    /// order: every request is logged, then authenticated, then
    /// rate-limited; only then does routing pick the local handlers or the
    /// upstream forward.
    fn build_router(
        config: &GatewayConfig,
        state: AppState,
        auth: AuthState,
        limiter: Arc<RateLimiter>,
    ) -> Router {
        Router::new()
            .route("/", get(welcome))
            .route("/health", get(health))
            .fallback(forward_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    )))
                    .layer(SetRequestIdLayer::x_request_id(GatewayRequestId))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(middleware::from_fn(log_entry))
                    .layer(middleware::from_fn_with_state(auth, require_api_key))
                    .layer(middleware::from_fn_with_state(
                        limiter,
                        rate_limit_middleware,
                    )),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Split the configured base URL into the URI parts used to re-target
/// every forwarded request.
fn upstream_target(base_url: &str) -> Result<(Scheme, Authority), ServerError> {
    let uri =
        Uri::from_str(base_url).map_err(|_| ServerError::InvalidUpstream(base_url.to_string()))?;
    let scheme = uri
        .scheme()
        .cloned()
        .ok_or_else(|| ServerError::InvalidUpstream(base_url.to_string()))?;
    let authority = uri
        .authority()
        .cloned()
        .ok_or_else(|| ServerError::InvalidUpstream(base_url.to_string()))?;
    Ok((scheme, authority))
}

/// Local welcome route; never forwarded.
async fn welcome() -> impl IntoResponse {
    Json(json!({ "message": "Welcome to the API Security Gateway!" }))
}

/// Local health route; reports the gateway process itself, not the
/// upstream.
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

/// Forward handler: mirrors the policed request to the upstream and
/// relays the response.
///
/// Single attempt; retrying is a caller concern. Any transport failure,
/// including a failed body read, is a 502.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method_str = request.method().to_string();

    let (parts, body) = request.into_parts();

    // Re-target the inbound URI at the upstream, keeping path and query.
    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(state.upstream_scheme.clone());
    uri_parts.authority = Some(state.upstream_authority.clone());
    let uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build upstream URI");
            return reject(StatusCode::BAD_GATEWAY, "Bad Gateway");
        }
    };

    // Copy method and headers verbatim; the request ID travels with them.
    let mut builder = Request::builder().method(parts.method.clone()).uri(uri);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in parts.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
    }
    let outbound = match builder.body(body) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build upstream request");
            return reject(StatusCode::BAD_GATEWAY, "Bad Gateway");
        }
    };

    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    match state.client.request(outbound).await {
        Ok(response) => {
            let status = response.status();
            let (parts, body) = response.into_parts();

            // The whole body is needed before re-emission: JSON relays are
            // re-encoded, not streamed.
            let bytes = match collect_body(body).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(request_id = %request_id, error = %e, "Failed reading upstream body");
                    metrics::record_request(&method_str, 502, start_time);
                    return reject(StatusCode::BAD_GATEWAY, "Bad Gateway");
                }
            };

            match UpstreamReply::classify(status, parts.headers, bytes) {
                Ok(reply) => {
                    metrics::record_request(&method_str, status.as_u16(), start_time);
                    reply.into_response()
                }
                Err(_) => {
                    tracing::error!(
                        request_id = %request_id,
                        status = %status,
                        "Upstream declared JSON but body did not parse"
                    );
                    metrics::record_request(&method_str, 500, start_time);
                    reject(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Error processing JSON response",
                    )
                }
            }
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream request failed");
            metrics::record_request(&method_str, 502, start_time);
            reject(StatusCode::BAD_GATEWAY, "Bad Gateway")
        }
    }
}

async fn collect_body(body: hyper::body::Incoming) -> Result<Bytes, axum::Error> {
    axum::body::to_bytes(Body::new(body), usize::MAX).await
}

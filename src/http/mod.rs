//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware pipeline)
//!     → request.rs (request ID, unconditional entry log)
//!     → security middleware (auth, rate limit)
//!     → local handler | upstream forward
//!     → response.rs (content-type-aware reconstruction)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{GatewayRequestId, X_REQUEST_ID};
pub use server::HttpServer;

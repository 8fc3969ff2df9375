//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → auth.rs (x-api-key check, 401 on mismatch)
//!     → rate_limit.rs (per-client fixed window, 429 past the limit)
//!     → Pass to routing (local handlers or upstream forward)
//! ```
//!
//! # Design Decisions
//! - Policies evaluated strictly in order; first failure short-circuits
//! - Auth failures never touch the rate-limit counter
//! - The only shared state (the counters) lives in the external store

pub mod auth;
pub mod rate_limit;

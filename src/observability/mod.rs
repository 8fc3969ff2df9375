//! Observability subsystem.
//!
//! Structured logging is initialized in `main` via `tracing-subscriber`;
//! this module owns the metrics exporter and the recorders the request
//! path calls.

pub mod metrics;

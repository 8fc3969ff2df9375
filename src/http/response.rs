//! Response reconstruction for proxied requests.
//!
//! # Responsibilities
//! - Re-emit upstream responses: structurally for declared JSON,
//!   byte-for-byte for everything else
//! - Map gateway policy failures to uniform `{"detail": ...}` JSON bodies
//!
//! # Design Decisions
//! - The content-type decision is a typed union, not an inline branch, so
//!   the forwarding logic stays exhaustive and testable
//! - Framing headers (`content-length`, `transfer-encoding`) are dropped:
//!   the body has been collected and re-framed by the time it leaves here

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

/// An upstream response, classified by declared content type.
#[derive(Debug)]
pub enum UpstreamReply {
    /// `application/json`: parsed and re-encoded. Field values survive the
    /// round trip; exact bytes need not.
    Json {
        status: StatusCode,
        headers: HeaderMap,
        value: Value,
    },

    /// Everything else: relayed unchanged.
    Raw {
        status: StatusCode,
        headers: HeaderMap,
        bytes: Bytes,
    },
}

/// A body declared as JSON that does not parse as JSON.
#[derive(Debug, PartialEq, Eq)]
pub struct MalformedJson;

impl UpstreamReply {
    /// Classify a fully-read upstream response by its `content-type`.
    pub fn classify(
        status: StatusCode,
        headers: HeaderMap,
        bytes: Bytes,
    ) -> Result<Self, MalformedJson> {
        let declared_json = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        if declared_json {
            let value = serde_json::from_slice(&bytes).map_err(|_| MalformedJson)?;
            Ok(Self::Json {
                status,
                headers,
                value,
            })
        } else {
            Ok(Self::Raw {
                status,
                headers,
                bytes,
            })
        }
    }
}

impl IntoResponse for UpstreamReply {
    fn into_response(self) -> Response {
        let (status, mut headers, body) = match self {
            Self::Json {
                status,
                headers,
                value,
            } => match serde_json::to_vec(&value) {
                Ok(bytes) => (status, headers, Body::from(bytes)),
                Err(_) => {
                    return reject(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Error processing JSON response",
                    )
                }
            },
            Self::Raw {
                status,
                headers,
                bytes,
            } => (status, headers, Body::from(bytes)),
        };

        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::TRANSFER_ENCODING);

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

/// Build a policy or error response with the gateway's uniform JSON body.
pub fn reject(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

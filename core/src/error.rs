//! Error types for the Mochi API client.
//!
//! # Design
//! `Authentication` and `NotFound` get dedicated variants because callers
//! routinely branch on "bad key" and "no such card". Every other non-2xx
//! status lands in `Service` with the status code and, when the body carries
//! one, the service's `"message"`. Mapper failures are split by direction:
//! `MalformedResponse` for bodies we cannot decode, `InvalidInput` for write
//! payloads missing required fields.

use thiserror::Error;

/// Errors returned by `MochiClient` and the pagination cursor.
#[derive(Debug, Error)]
pub enum MochiError {
    /// The service returned 401.
    #[error("authentication failed: invalid API key")]
    Authentication,

    /// The service returned 404.
    #[error("resource not found")]
    NotFound,

    /// The service returned a non-2xx status other than 401/404.
    #[error("service error (HTTP {status}): {}", .message.as_deref().unwrap_or("unknown error"))]
    Service { status: u16, message: Option<String> },

    /// The response body is missing required fields or has the wrong shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A write payload is missing a field the operation requires.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No credential could be resolved when building the client.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The executor failed before a response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, MochiError>;

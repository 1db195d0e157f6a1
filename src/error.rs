//! Error taxonomy shared by every layer of the transport core.
//!
//! Two families matter to callers:
//! - the service rejected the call ([`Error::Server`], [`Error::UnexpectedStatus`])
//! - the call never reached a service ([`Error::NoEndpointReachable`],
//!   [`Error::Transport`], [`Error::Canceled`], [`Error::DeadlineExceeded`])

use std::fmt;
use thiserror::Error;

use crate::net::transport::TransportError;

/// Structured error envelope returned by the database service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    /// HTTP compatible status of the response carrying the envelope.
    pub status: u16,
    /// `code` field of the envelope (usually equal to `status`).
    pub code: u16,
    /// Service specific error number (`errorNum`).
    pub error_num: i64,
    /// Human readable message (`errorMessage`).
    pub message: String,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "server error {} (errorNum {}): {}",
            self.code, self.error_num, self.message
        )
    }
}

impl std::error::Error for ServerError {}

/// Errors produced by connections, requests and responses.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed method, path, endpoint or credential.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Value cannot be represented in the active encoding.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Body could not be decoded into the requested type.
    #[error("decode error: {0}")]
    Decode(String),

    /// Body has the wrong shape for the requested operation.
    #[error("type mismatch: expected {expected} body, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Named field is absent from the body.
    #[error("field '{0}' not found in response body")]
    NotFound(String),

    /// Status outside the accepted set and no service envelope in the body.
    #[error("unexpected status {status}: {body_excerpt}")]
    UnexpectedStatus { status: u16, body_excerpt: String },

    /// Status outside the accepted set with a parsed service envelope.
    #[error(transparent)]
    Server(ServerError),

    /// The caller's context was canceled.
    #[error("operation canceled")]
    Canceled,

    /// The caller's deadline passed before the exchange completed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Decode attempted into an absent receiver.
    #[error("invalid decode target: {0}")]
    InvalidTarget(&'static str),

    /// Every configured endpoint failed at the transport level.
    #[error("no endpoint reachable after {} attempt(s){}", .attempts.len(), format_attempts(.attempts))]
    NoEndpointReachable {
        attempts: Vec<(String, TransportError)>,
    },

    /// Transport failure that does not warrant failover.
    #[error("transport error: {0}")]
    Transport(TransportError),
}

fn format_attempts(attempts: &[(String, TransportError)]) -> String {
    attempts
        .iter()
        .map(|(endpoint, err)| format!("; {}: {}", endpoint, err))
        .collect()
}

impl Error {
    /// The service answered but refused the call.
    pub fn is_service_rejection(&self) -> bool {
        matches!(self, Error::Server(_) | Error::UnexpectedStatus { .. })
    }

    /// No endpoint could be reached.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Error::NoEndpointReachable { .. } | Error::Transport(_))
    }

    /// Status code attached to the error, if the service answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Server(e) => Some(e.status),
            Error::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for transport core operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Authentication descriptors.
//!
//! # Security Constraints
//! - Credentials are never logged; `Debug` redacts secrets
//! - Credentials are applied to the outgoing wire request only, never
//!   written back into the caller's `Request`

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hyper::header::HeaderValue;
use std::fmt;

use crate::error::{Error, Result};

/// Credential applied to every call of a connection.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Authentication {
    /// No `Authorization` header.
    #[default]
    None,
    /// HTTP basic authentication.
    Basic { username: String, password: String },
    /// Bearer token (e.g. a JWT).
    Bearer(String),
    /// Header value used verbatim.
    Raw(String),
}

impl Authentication {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Authentication::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Authentication::Bearer(token.into())
    }

    pub fn raw(value: impl Into<String>) -> Self {
        Authentication::Raw(value.into())
    }

    /// Check the credential can be sent as a header.
    pub fn validate(&self) -> Result<()> {
        match self {
            Authentication::None => return Ok(()),
            Authentication::Basic { username, .. } if username.contains(':') => {
                return Err(Error::InvalidArgument(
                    "basic auth username must not contain ':'".into(),
                ))
            }
            Authentication::Bearer(token) if token.is_empty() => {
                return Err(Error::InvalidArgument("bearer token is empty".into()))
            }
            _ => {}
        }
        if let Some(value) = self.header_value() {
            HeaderValue::from_str(&value).map_err(|_| {
                Error::InvalidArgument("credential contains characters not allowed in a header".into())
            })?;
        }
        Ok(())
    }

    /// Value of the `Authorization` header, if any.
    pub fn header_value(&self) -> Option<String> {
        match self {
            Authentication::None => None,
            Authentication::Basic { username, password } => Some(format!(
                "Basic {}",
                STANDARD.encode(format!("{}:{}", username, password))
            )),
            Authentication::Bearer(token) => Some(format!("Bearer {}", token)),
            Authentication::Raw(value) => Some(value.clone()),
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Authentication::None => "none",
            Authentication::Basic { .. } => "basic",
            Authentication::Bearer(_) => "bearer",
            Authentication::Raw(_) => "raw",
        }
    }
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authentication::None => f.write_str("None"),
            Authentication::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Authentication::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Authentication::Raw(_) => f.write_str("Raw(<redacted>)"),
        }
    }
}

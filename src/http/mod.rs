//! Request and response types.
//!
//! # Data Flow
//! ```text
//! Connection::new_request
//!     → request.rs (query, headers, encoded body)
//!     → Connection::execute (wire headers, failover)
//!     → response.rs (status check, body / field / batch parsing)
//! ```

pub mod request;
pub mod response;

pub use request::{Request, X_REQUEST_ID};
pub use response::Response;

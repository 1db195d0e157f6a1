//! Endpoint selection subsystem.
//!
//! # Data Flow
//! ```text
//! Connection::execute
//!     → pool.rs (load one EndpointSet snapshot)
//!     → EndpointSet::endpoints (configured order, every call)
//!     → endpoint.rs (URL for the call, health bookkeeping)
//! ```
//!
//! # Design Decisions
//! - Primary-first: the first reachable configured endpoint serves the call
//! - Health state feeds logs and metrics only; it never reorders dispatch
//! - Replacement is an atomic swap; in-flight calls keep their snapshot

pub mod endpoint;
pub mod pool;

pub use endpoint::{Endpoint, HealthState};
pub use pool::{EndpointPool, EndpointSet};

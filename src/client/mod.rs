//! Client subsystem.
//!
//! # Data Flow
//! ```text
//! ConnectionConfig
//!     → Connection::new / from_config (validate, build endpoint pool)
//!     → new_request → Request (http/request.rs)
//!     → execute:
//!         snapshot endpoints (load_balancer/pool.rs)
//!         → per endpoint: Transport::send (net/transport.rs)
//!         → first completed exchange → Response (http/response.rs)
//! ```
//!
//! # Design Decisions
//! - Connection values are cheap handles over shared state
//! - Credentials live on the handle, not on the shared state

pub mod connection;

pub use connection::Connection;

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Connection::execute produces:
//!     → logging.rs (structured log events: attempts, failovers)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → whatever subscriber / recorder the application installs
//! ```
//!
//! # Design Decisions
//! - Request ID flows into every attempt's log events
//! - Metrics are cheap (atomic increments) and no-ops without a recorder

pub mod logging;
pub mod metrics;

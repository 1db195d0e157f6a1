//! Call lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! Caller builds a Context (context.rs):
//!     background → with_timeout / with_deadline / with_cancel
//!
//! Connection::execute:
//!     check() before dispatch
//!     → each attempt races the transport against done()
//!     → Canceled / DeadlineExceeded returned unchanged
//! ```
//!
//! # Design Decisions
//! - Contexts are values; deriving never mutates the parent
//! - Cancellation uses watch channels so late subscribers see the signal
//! - The earliest deadline in a chain always wins

pub mod context;

pub use context::{CancelHandle, Context};

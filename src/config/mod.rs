//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ConnectionConfig (validated, immutable)
//!     → Connection::from_config / Connection::new
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; endpoints change only via update_endpoints
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ConnectionConfig, HealthConfig, ObservabilityConfig, TimeoutConfig};
pub use validation::{validate_config, ValidationError};

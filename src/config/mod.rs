//! Process settings subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML)
//!     → loader.rs (read & deserialize)
//!     → CLI overrides (main.rs)
//!     → validation.rs (semantic checks, all errors collected)
//!     → ServiceConfig (validated, immutable)
//!     → ServiceBuilder / HttpServer / observability
//! ```
//!
//! # Design Decisions
//! - Every field has a default so an empty file is a valid configuration
//! - Validation separates syntactic (serde) from semantic checks
//! - Settings are read once at startup; the schedule file is what hot-reloads

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::{
    ListenerConfig, ObservabilityConfig, ServiceConfig, SourceConfig, TimeoutConfig,
    DEFAULT_LOCAL_CONFIG_FILE,
};
pub use validation::{validate_config, ValidationError};

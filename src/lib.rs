//! Dynamic configuration distribution service.
//!
//! Telemetry clients poll with their resource attributes and the fingerprint
//! of the last configuration they applied; the service answers "unchanged" or
//! sends the full schedule set for that resource.

pub mod backend;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod matching;
pub mod model;
pub mod observability;
pub mod protocol;
pub mod service;

pub use backend::{Backend, BackendError, UpdateStrategy};
pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use service::{ConfigService, ServiceBuilder};

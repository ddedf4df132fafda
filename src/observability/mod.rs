//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (request, reload and upstream counters; request latency)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by EnvFilter)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event so logs stay machine-parsable
//! - `RUST_LOG` overrides the configured log level
//! - Metric updates are cheap; with no recorder installed they are no-ops

pub mod logging;
pub mod metrics;

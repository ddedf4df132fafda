//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → HTTP server stops accepting, drains in-flight polls
//!             → ConfigService::close (watcher dropped, cache worker stopped)
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans the shutdown out to every long-running task
//! - Backends are closed after the server drains, so in-flight polls finish

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;

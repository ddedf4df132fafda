//! Configuration backend subsystem.
//!
//! # Data Flow
//! ```text
//! File:
//!     schedule file → loader.rs → ArcSwap<Config>
//!     watcher.rs (notify) → loader.rs → swap on success, keep last-good on failure
//!     request → match/merge current snapshot → fingerprint or full response
//!
//! Remote:
//!     request → refresh command → cache worker → upstream POST /v1/config
//!     → cache (single writer) → response
//!     upstream failure → serve cache, or error when nothing is cached
//!
//! Fixed:
//!     request → stored response (tests, stand-in upstream)
//! ```
//!
//! # Design Decisions
//! - Closed set of backends chosen once at build time; no runtime re-selection
//! - Every backend hands out complete (fingerprint, response) pairs from one snapshot
//! - Locks are never held across I/O; snapshots are swapped whole

pub mod file;
pub mod fixed;
pub mod loader;
pub mod remote;
pub mod watcher;

pub use file::{FileBackend, DEFAULT_WAIT_TIME_SECS};
pub use fixed::FixedBackend;
pub use loader::{load_schedules, parse_schedules, LoadError};
pub use remote::{RemoteBackend, UpdateStrategy};

use std::path::PathBuf;

use thiserror::Error;

use crate::matching::Resource;
use crate::protocol::{ClientError, ConfigResponse};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to load schedule file {path:?}: {source}")]
    Load { path: PathBuf, source: LoadError },

    #[error("failed to watch schedule file {path:?}: {source}")]
    Watch { path: PathBuf, source: notify::Error },

    #[error("upstream request failed: {0}")]
    Upstream(#[from] ClientError),

    #[error("upstream returned no configuration")]
    NoConfiguration,

    #[error("backend is closed")]
    Closed,

    #[error("remote backend requires a running Tokio runtime")]
    NoRuntime,
}

/// The configuration source behind a service.
pub enum Backend {
    File(FileBackend),
    Remote(RemoteBackend),
    Fixed(FixedBackend),
}

impl Backend {
    pub fn kind(&self) -> &'static str {
        match self {
            Backend::File(_) => "file",
            Backend::Remote(_) => "remote",
            Backend::Fixed(_) => "fixed",
        }
    }

    /// Current fingerprint for `resource`.
    pub async fn fingerprint(&self, resource: &Resource) -> Result<Vec<u8>, BackendError> {
        match self {
            Backend::File(backend) => backend.fingerprint(resource),
            Backend::Remote(backend) => backend.fingerprint(resource).await,
            Backend::Fixed(backend) => backend.fingerprint(),
        }
    }

    /// Full response for `resource`, with its fingerprint embedded.
    pub async fn build_config_response(&self, resource: &Resource) -> Result<ConfigResponse, BackendError> {
        match self {
            Backend::File(backend) => backend.build_config_response(resource),
            Backend::Remote(backend) => backend.build_config_response(resource).await,
            Backend::Fixed(backend) => backend.build_config_response(),
        }
    }

    pub fn suggested_wait_time(&self) -> i32 {
        match self {
            Backend::File(backend) => backend.wait_time(),
            Backend::Remote(backend) => backend.suggested_wait_time(),
            Backend::Fixed(backend) => backend.suggested_wait_time(),
        }
    }

    /// Release watches and workers. Idempotent.
    pub fn close(&self) {
        match self {
            Backend::File(backend) => backend.close(),
            Backend::Remote(backend) => backend.close(),
            Backend::Fixed(backend) => backend.close(),
        }
    }
}

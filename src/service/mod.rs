//! Config service subsystem.
//!
//! # Data Flow
//! ```text
//! ConfigRequest (resource, last_known_fingerprint)
//!     → validate request
//!     → Backend::fingerprint(resource)
//!     → equal to last_known_fingerprint?
//!         yes → ConfigResponse { fingerprint, suggested_wait_time_seconds }
//!         no  → Backend::build_config_response(resource)
//! ```
//!
//! # Design Decisions
//! - Stateless across requests; the backend owns all state
//! - The full response carries the fingerprint it was built with, so a
//!   fingerprint is never paired with schedules from another snapshot
//! - An empty client fingerprint is never a cache hit
//! - Backend failures surface as typed errors; nothing partial is returned

pub mod builder;

pub use builder::{BuildError, ServiceBuilder};

use std::time::Instant;

use thiserror::Error;

use crate::backend::{Backend, BackendError};
use crate::observability::metrics;
use crate::protocol::{ConfigRequest, ConfigResponse};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

/// Answers client polls from one backend.
pub struct ConfigService {
    backend: Backend,
}

impl ConfigService {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::new()
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Handle one poll.
    pub async fn get_config(&self, request: ConfigRequest) -> Result<ConfigResponse, ServiceError> {
        let start = Instant::now();
        let result = self.respond(&request).await;

        let outcome = match &result {
            Ok(response) if response.is_full() => "miss",
            Ok(_) => "hit",
            Err(_) => "error",
        };
        metrics::record_request(outcome, start);

        if let Err(e) = &result {
            tracing::warn!(backend = self.backend.kind(), error = %e, "Config request failed");
        }
        result
    }

    async fn respond(&self, request: &ConfigRequest) -> Result<ConfigResponse, ServiceError> {
        validate_request(request)?;

        let current = self.backend.fingerprint(&request.resource).await?;
        if is_same_fingerprint(&request.last_known_fingerprint, &current) {
            tracing::debug!(backend = self.backend.kind(), "Config unchanged");
            return Ok(ConfigResponse::unchanged(
                current,
                self.backend.suggested_wait_time(),
            ));
        }

        let response = self.backend.build_config_response(&request.resource).await?;
        tracing::debug!(
            backend = self.backend.kind(),
            schedules = response.metric_config.as_ref().map(|m| m.schedules.len()).unwrap_or(0),
            "Serving full config"
        );
        Ok(response)
    }

    /// Close the backend. Idempotent.
    pub fn close(&self) {
        self.backend.close();
    }
}

/// True when the client already holds `current`. An empty fingerprint never matches.
pub fn is_same_fingerprint(last_known: &[u8], current: &[u8]) -> bool {
    !last_known.is_empty() && last_known == current
}

fn validate_request(request: &ConfigRequest) -> Result<(), ServiceError> {
    if let Some(index) = request
        .resource
        .attributes
        .iter()
        .position(|kv| kv.key.trim().is_empty())
    {
        return Err(ServiceError::MalformedRequest(format!(
            "resource attribute {} has an empty key",
            index
        )));
    }
    Ok(())
}

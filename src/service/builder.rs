//! Service construction.
//!
//! # Responsibilities
//! - Select exactly one backend from the configured sources
//! - Forward wait time, update strategy and matching mode where they apply
//!
//! # Design Decisions
//! - Zero or several sources is an error, reported before anything is opened
//! - Options that do not apply to the chosen backend are ignored

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::backend::{Backend, BackendError, FileBackend, FixedBackend, RemoteBackend, UpdateStrategy};
use crate::config::ServiceConfig;
use crate::service::ConfigService;

const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("missing backend specification: configure a local file, a remote endpoint or a fixed response")]
    MissingBackend,

    #[error("ambiguous backend specification: {} configured, expected exactly one", join_names(.0))]
    AmbiguousBackend(Vec<&'static str>),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

fn join_names(names: &[&'static str]) -> String {
    names.join(", ")
}

pub struct ServiceBuilder {
    local_file: Option<PathBuf>,
    remote_endpoint: Option<String>,
    fixed: Option<FixedBackend>,
    wait_time: Option<i32>,
    update_strategy: UpdateStrategy,
    resource_matching: bool,
    upstream_timeout: Duration,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self {
            local_file: None,
            remote_endpoint: None,
            fixed: None,
            wait_time: None,
            update_strategy: UpdateStrategy::Default,
            resource_matching: true,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    /// Builder preloaded from process settings.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let source = &config.source;
        let mut builder = Self::new()
            .wait_time(source.wait_time_secs)
            .update_strategy(source.update_strategy)
            .resource_matching(source.resource_matching)
            .upstream_timeout(config.timeouts.upstream());

        if let Some(path) = source.local_config_file() {
            builder = builder.local_file(path);
        }
        if let Some(endpoint) = &source.remote_endpoint {
            builder = builder.remote(endpoint);
        }
        builder
    }

    pub fn local_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_file = Some(path.into());
        self
    }

    pub fn remote(mut self, endpoint: impl Into<String>) -> Self {
        self.remote_endpoint = Some(endpoint.into());
        self
    }

    pub fn fixed(mut self, backend: FixedBackend) -> Self {
        self.fixed = Some(backend);
        self
    }

    /// Suggested client poll interval for the file backend.
    pub fn wait_time(mut self, seconds: i32) -> Self {
        self.wait_time = Some(seconds);
        self
    }

    pub fn update_strategy(mut self, strategy: UpdateStrategy) -> Self {
        self.update_strategy = strategy;
        self
    }

    pub fn resource_matching(mut self, enabled: bool) -> Self {
        self.resource_matching = enabled;
        self
    }

    pub fn upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ConfigService, BuildError> {
        let configured: Vec<&'static str> = [
            ("local file", self.local_file.is_some()),
            ("remote endpoint", self.remote_endpoint.is_some()),
            ("fixed response", self.fixed.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect();

        if configured.len() > 1 {
            return Err(BuildError::AmbiguousBackend(configured));
        }

        let backend = if let Some(path) = self.local_file {
            let mut backend = FileBackend::open(&path)?.with_resource_matching(self.resource_matching);
            if let Some(seconds) = self.wait_time {
                backend = backend.with_wait_time(seconds);
            }
            Backend::File(backend)
        } else if let Some(endpoint) = self.remote_endpoint {
            let backend = RemoteBackend::connect(&endpoint, self.upstream_timeout)?
                .with_update_strategy(self.update_strategy);
            Backend::Remote(backend)
        } else if let Some(fixed) = self.fixed {
            Backend::Fixed(fixed)
        } else {
            return Err(BuildError::MissingBackend);
        };

        tracing::info!(backend = backend.kind(), "Config service built");
        Ok(ConfigService::new(backend))
    }
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConfigBlock;

    #[test]
    fn test_missing_backend() {
        assert!(matches!(
            ServiceBuilder::new().build(),
            Err(BuildError::MissingBackend)
        ));
    }

    #[test]
    fn test_ambiguous_backend() {
        let err = ServiceBuilder::new()
            .local_file("schedules.yaml")
            .remote("localhost:55700")
            .build()
            .err();
        match err {
            Some(BuildError::AmbiguousBackend(names)) => {
                assert_eq!(names, vec!["local file", "remote endpoint"])
            }
            other => panic!("expected ambiguous backend, got {:?}", other),
        }
    }

    #[test]
    fn test_fixed_ignores_other_options() {
        let service = ServiceBuilder::new()
            .fixed(FixedBackend::from_block(&ConfigBlock::default(), 5))
            .wait_time(90)
            .update_strategy(UpdateStrategy::OnGetFingerprint)
            .build()
            .unwrap();
        assert_eq!(service.backend().kind(), "fixed");
        assert_eq!(service.backend().suggested_wait_time(), 5);
    }

    #[test]
    fn test_missing_file_is_a_build_error() {
        assert!(matches!(
            ServiceBuilder::new().local_file("/nonexistent/schedules.yaml").build(),
            Err(BuildError::Backend(BackendError::Load { .. }))
        ));
    }

    #[tokio::test]
    async fn test_remote_strategy_forwarded() {
        let service = ServiceBuilder::new()
            .remote("127.0.0.1:1")
            .update_strategy(UpdateStrategy::OnGetFingerprint)
            .build()
            .unwrap();
        match service.backend() {
            Backend::Remote(remote) => {
                assert_eq!(remote.update_strategy(), UpdateStrategy::OnGetFingerprint)
            }
            _ => panic!("expected remote backend"),
        }
        service.close();
    }

    #[test]
    fn test_from_config_defaults_to_local_file() {
        let builder = ServiceBuilder::from_config(&ServiceConfig::default());
        assert_eq!(
            builder.local_file.as_deref(),
            Some(std::path::Path::new(crate::config::DEFAULT_LOCAL_CONFIG_FILE))
        );
        assert!(builder.remote_endpoint.is_none());
    }
}

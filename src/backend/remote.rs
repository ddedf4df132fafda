//! Remote upstream backend.
//!
//! # Responsibilities
//! - Forward polls to an upstream config authority
//! - Keep exactly one cached response, written only by the cache worker
//! - Serve the cached response when an upstream round trip fails
//!
//! # Design Decisions
//! - A single worker task owns every cache write; callers send it a refresh
//!   command and await the result over a oneshot channel
//! - Readers load the cache through `ArcSwapOption`, so they always see a
//!   complete response, never a half-written one
//! - Closing triggers the worker's shutdown signal; pending callers are
//!   answered with `BackendError::Closed`

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::backend::BackendError;
use crate::lifecycle::Shutdown;
use crate::matching::Resource;
use crate::observability::metrics;
use crate::protocol::{ConfigClient, ConfigRequest, ConfigResponse};

/// When the cached upstream response is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStrategy {
    /// Refresh on every call.
    #[default]
    Default,
    /// Refresh only on fingerprint checks; full responses come from the cache.
    OnGetFingerprint,
}

const COMMAND_BUFFER: usize = 64;

enum Command {
    Refresh {
        resource: Resource,
        reply: oneshot::Sender<Result<Arc<ConfigResponse>, BackendError>>,
    },
}

pub struct RemoteBackend {
    endpoint: String,
    cache: Arc<ArcSwapOption<ConfigResponse>>,
    commands: mpsc::Sender<Command>,
    strategy: UpdateStrategy,
    shutdown: Shutdown,
    closed: AtomicBool,
}

impl RemoteBackend {
    /// Create a backend for the upstream at `endpoint` and start its cache worker.
    ///
    /// No connection is made here. Must be called within a Tokio runtime.
    pub fn connect(endpoint: &str, timeout: Duration) -> Result<Self, BackendError> {
        let handle = Handle::try_current().map_err(|_| BackendError::NoRuntime)?;
        let client = ConfigClient::new(endpoint, timeout)?;

        let cache = Arc::new(ArcSwapOption::empty());
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let shutdown = Shutdown::new();

        let worker = CacheWorker {
            client,
            cache: cache.clone(),
        };
        handle.spawn(worker.run(rx, shutdown.subscribe()));

        tracing::info!(endpoint = %endpoint, "Remote backend started");

        Ok(Self {
            endpoint: endpoint.to_string(),
            cache,
            commands,
            strategy: UpdateStrategy::Default,
            shutdown,
            closed: AtomicBool::new(false),
        })
    }

    pub fn with_update_strategy(mut self, strategy: UpdateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn update_strategy(&self) -> UpdateStrategy {
        self.strategy
    }

    /// The last response received from upstream, if any.
    pub fn cached(&self) -> Option<Arc<ConfigResponse>> {
        self.cache.load_full()
    }

    /// Wait time suggested by the cached upstream response, or 0 before the first fetch.
    pub fn suggested_wait_time(&self) -> i32 {
        self.cached()
            .map(|response| response.suggested_wait_time_seconds)
            .unwrap_or(0)
    }

    pub async fn fingerprint(&self, resource: &Resource) -> Result<Vec<u8>, BackendError> {
        let response = self.refresh_or_cached(resource).await?;
        Ok(response.fingerprint.clone())
    }

    pub async fn build_config_response(&self, resource: &Resource) -> Result<ConfigResponse, BackendError> {
        let response = match self.strategy {
            UpdateStrategy::Default => self.refresh_or_cached(resource).await?,
            UpdateStrategy::OnGetFingerprint => {
                self.check_open()?;
                match self.cached() {
                    Some(cached) => cached,
                    None => self.refresh_or_cached(resource).await?,
                }
            }
        };
        Ok(ConfigResponse::clone(&response))
    }

    /// Stop the cache worker. Safe to call more than once.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shutdown.trigger();
        tracing::info!(endpoint = %self.endpoint, "Remote backend closed");
    }

    fn check_open(&self) -> Result<(), BackendError> {
        if self.closed.load(Ordering::Acquire) {
            Err(BackendError::Closed)
        } else {
            Ok(())
        }
    }

    async fn refresh(&self, resource: &Resource) -> Result<Arc<ConfigResponse>, BackendError> {
        self.check_open()?;

        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Refresh {
                resource: resource.clone(),
                reply,
            })
            .await
            .map_err(|_| BackendError::Closed)?;

        rx.await.map_err(|_| BackendError::Closed)?
    }

    /// Refresh, falling back to the cache when upstream fails.
    async fn refresh_or_cached(&self, resource: &Resource) -> Result<Arc<ConfigResponse>, BackendError> {
        match self.refresh(resource).await {
            Ok(response) => Ok(response),
            Err(BackendError::Closed) => Err(BackendError::Closed),
            Err(e) => match self.cached() {
                Some(cached) => {
                    tracing::warn!(
                        endpoint = %self.endpoint,
                        error = %e,
                        "Upstream refresh failed, serving cached configuration"
                    );
                    Ok(cached)
                }
                None => Err(e),
            },
        }
    }
}

impl Drop for RemoteBackend {
    fn drop(&mut self) {
        self.close();
    }
}

/// Sole writer of the remote cache.
struct CacheWorker {
    client: ConfigClient,
    cache: Arc<ArcSwapOption<ConfigResponse>>,
}

impl CacheWorker {
    async fn run(self, mut commands: mpsc::Receiver<Command>, mut shutdown: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                command = commands.recv() => match command {
                    Some(Command::Refresh { resource, reply }) => {
                        tokio::select! {
                            biased;
                            _ = shutdown.recv() => {
                                let _ = reply.send(Err(BackendError::Closed));
                                break;
                            }
                            result = self.sync(&resource) => {
                                let _ = reply.send(result);
                            }
                        }
                    }
                    None => break,
                },
            }
        }

        commands.close();
        while let Ok(Command::Refresh { reply, .. }) = commands.try_recv() {
            let _ = reply.send(Err(BackendError::Closed));
        }
        tracing::debug!("Remote cache worker stopped");
    }

    async fn sync(&self, resource: &Resource) -> Result<Arc<ConfigResponse>, BackendError> {
        let cached = self.cache.load_full();
        let last_fingerprint = cached
            .as_ref()
            .map(|response| response.fingerprint.clone())
            .unwrap_or_default();

        let response = self.fetch(resource, last_fingerprint).await?;
        if response.is_full() {
            return Ok(self.store(response, cached.as_deref()));
        }

        // Fingerprint-only reply: upstream agrees with our cache, or we need the full payload.
        if let Some(cached) = cached {
            if cached.fingerprint == response.fingerprint {
                return Ok(cached);
            }
        }

        let full = self.fetch(resource, Vec::new()).await?;
        if !full.is_full() {
            return Err(BackendError::NoConfiguration);
        }
        let previous = self.cache.load_full();
        Ok(self.store(full, previous.as_deref()))
    }

    async fn fetch(&self, resource: &Resource, last_known_fingerprint: Vec<u8>) -> Result<ConfigResponse, BackendError> {
        let request = ConfigRequest::new(resource.clone(), last_known_fingerprint);
        match self.client.get_config(&request).await {
            Ok(response) => {
                metrics::record_upstream(true);
                Ok(response)
            }
            Err(e) => {
                metrics::record_upstream(false);
                Err(e.into())
            }
        }
    }

    fn store(&self, response: ConfigResponse, previous: Option<&ConfigResponse>) -> Arc<ConfigResponse> {
        if previous.map(|p| p.fingerprint != response.fingerprint).unwrap_or(true) {
            tracing::info!(
                endpoint = %self.client.config_url(),
                schedules = response.metric_config.as_ref().map(|m| m.schedules.len()).unwrap_or(0),
                "Upstream configuration changed"
            );
        }
        let response = Arc::new(response);
        self.cache.store(Some(response.clone()));
        response
    }
}

//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use dynamic_config::config::ServiceConfig;
use dynamic_config::lifecycle::Shutdown;
use dynamic_config::{ConfigService, HttpServer};

/// A config service listening on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub service: Arc<ConfigService>,
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config_url(&self) -> String {
        format!("http://{}/v1/config", self.addr)
    }

    /// Stop accepting, drain and close the service.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
        self.service.close();
    }
}

pub async fn spawn_server(service: ConfigService) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let service = Arc::new(service);
    let shutdown = Shutdown::new();
    let server = HttpServer::new(service.clone(), &ServiceConfig::default());
    let rx = shutdown.subscribe();

    let handle = tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    TestServer {
        addr,
        service,
        shutdown,
        handle,
    }
}

/// Replace `path` in one step so the watcher never sees a half-written file.
pub fn write_atomically(path: &Path, content: &str) {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content).unwrap();
    std::fs::rename(&tmp, path).unwrap();
}

/// Poll `check` until it returns true or `timeout` elapses.
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

pub fn schedule_yaml(period: &str) -> String {
    format!("Schedules:\n  - Period: {}\n", period)
}

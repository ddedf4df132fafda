//! HTTP client for the config protocol.
//!
//! Used by the remote backend to reach its upstream authority and by
//! `config-cli` to poll a running service.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::protocol::types::{ConfigRequest, ConfigResponse};

/// Path of the config endpoint, relative to the service base URL.
pub const CONFIG_PATH: &str = "v1/config";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for one config service endpoint.
#[derive(Debug, Clone)]
pub struct ConfigClient {
    client: Client,
    config_url: Url,
}

impl ConfigClient {
    /// Create a client for `endpoint`.
    ///
    /// A bare `host:port` is treated as `http://host:port`. No connection is
    /// made until the first request.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ClientError> {
        let config_url = config_url(endpoint)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config_url })
    }

    pub fn config_url(&self) -> &Url {
        &self.config_url
    }

    /// Perform one poll.
    pub async fn get_config(&self, request: &ConfigRequest) -> Result<ConfigResponse, ClientError> {
        let resp = self
            .client
            .post(self.config_url.clone())
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or(text);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json::<ConfigResponse>().await?)
    }
}

/// Resolve the full config URL for a service endpoint.
pub fn config_url(endpoint: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let endpoint = endpoint.trim();
    let with_scheme = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    };

    let mut base = Url::parse(&with_scheme).map_err(|e| invalid(e.to_string()))?;
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme {:?}", base.scheme())));
    }
    if base.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(CONFIG_PATH).map_err(|e| invalid(e.to_string()))
}

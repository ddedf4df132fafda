//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the config and health handlers
//! - Wire up middleware (request ID, tracing, timeout, limits)
//! - Serve on a bound listener until shutdown is signalled
//! - Close the service once serving ends, whether or not it ended cleanly

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::http::request::{propagate_request_id, request_span, set_request_id};
use crate::http::response::ApiError;
use crate::protocol::{ConfigRequest, ConfigResponse};
use crate::service::ConfigService;

/// HTTP front end for a [`ConfigService`].
pub struct HttpServer {
    router: Router,
    service: Arc<ConfigService>,
}

impl HttpServer {
    pub fn new(service: Arc<ConfigService>, config: &ServiceConfig) -> Self {
        Self {
            router: Self::build_router(service.clone(), config),
            service,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(service: Arc<ConfigService>, config: &ServiceConfig) -> Router {
        Router::new()
            .route("/v1/config", post(config_handler))
            .route("/health", get(health_handler))
            .with_state(service)
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_size))
            .layer(ConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(TimeoutLayer::new(config.timeouts.request()))
            .layer(propagate_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(set_request_id())
    }

    /// The fully layered router, for serving it in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` fires, drain in-flight requests, then close the service.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let result = Self::serve(self.router, listener, shutdown).await;
        self.service.close();
        result
    }

    async fn serve(
        router: Router,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn config_handler(
    State(service): State<Arc<ConfigService>>,
    payload: Result<Json<ConfigRequest>, JsonRejection>,
) -> Result<Json<ConfigResponse>, ApiError> {
    let Json(request) = payload?;
    let response = service.get_config(request).await?;
    Ok(Json(response))
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::backend::{Backend, BackendError, FixedBackend};
    use crate::lifecycle::Shutdown;
    use crate::model::ConfigBlock;
    use crate::protocol::ConfigRequest;
    use crate::service::ServiceError;

    fn router(max_body_size: usize) -> Router {
        let mut config = ServiceConfig::default();
        config.listener.max_body_size = max_body_size;
        let service = ConfigService::new(Backend::Fixed(FixedBackend::from_block(&ConfigBlock::default(), 30)));
        HttpServer::new(Arc::new(service), &config).router()
    }

    fn config_request(body: impl Into<Body>) -> Request<Body> {
        Request::post("/v1/config")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn test_body_without_length_over_limit_is_413() {
        // No content-length header, so the limit is only hit while buffering.
        let response = router(1024)
            .oneshot(config_request(vec![b' '; 4096]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_rejections_keep_their_status() {
        let response = router(1024).oneshot(config_request("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router(1024)
            .oneshot(config_request(r#"{"resource": 7}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = router(1024).oneshot(config_request("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_run_closes_service_when_it_returns() {
        let service = Arc::new(ConfigService::new(Backend::Fixed(FixedBackend::from_block(
            &ConfigBlock::default(),
            30,
        ))));
        let server = HttpServer::new(service.clone(), &ServiceConfig::default());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = Shutdown::new();
        let rx = shutdown.subscribe();

        let handle = tokio::spawn(server.run(listener, rx));
        shutdown.trigger();
        handle.await.unwrap().unwrap();

        assert!(matches!(
            service.get_config(ConfigRequest::default()).await,
            Err(ServiceError::Backend(BackendError::Closed))
        ));
    }
}

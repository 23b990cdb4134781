//! # HTTP Server
//!
//! Wraps a role router (volume or router) in the shared middleware stack
//! and serves it until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderName;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::observability::{Event, MetricsRegistry};
use crate::routing::NodeTable;
use crate::service::StorageService;

use super::config::HttpServerConfig;
use super::errors::{HttpServerError, HttpServerResult};
use super::rate_limit::{rate_limit_middleware, RateLimiter};
use super::router_routes::{router_routes, RouterState};
use super::volume_routes::{volume_routes, VolumeState};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP server for one node role
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Server for a storage node
    pub fn volume(config: HttpServerConfig, service: StorageService) -> Self {
        let metrics = service.metrics().clone();
        let routes = volume_routes(Arc::new(VolumeState::new(service)));
        let router = Self::build_router(&config, routes, Some(metrics));
        Self { config, router }
    }

    /// Server for the routing front
    pub fn router_role(config: HttpServerConfig, nodes: NodeTable) -> Self {
        let routes = router_routes(Arc::new(RouterState::new(nodes)));
        let router = Self::build_router(&config, routes, None);
        Self { config, router }
    }

    /// Apply the middleware stack shared by both roles
    fn build_router(
        config: &HttpServerConfig,
        routes: Router,
        metrics: Option<Arc<MetricsRegistry>>,
    ) -> Router {
        // Configure CORS from config
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        let mut limiter = RateLimiter::new(config.rate_limit, config.rate_window_secs);
        if let Some(metrics) = metrics {
            limiter = limiter.with_metrics(metrics);
        }
        let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

        // Layers run bottom-up on the way in: the request id is assigned
        // first so the trace span and the limiter see it.
        routes
            .layer(DefaultBodyLimit::max(config.max_body_bytes))
            .layer(axum::middleware::from_fn_with_state(
                Arc::new(limiter),
                rate_limit_middleware,
            ))
            .layer(cors)
            .layer(CatchPanicLayer::new())
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl-C, then drain in-flight requests
    pub async fn start(self) -> HttpServerResult<()> {
        let addr: SocketAddr = self.config.bind_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| HttpServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        tracing::info!(event = %Event::Serving, addr = %addr);

        axum::serve(
            listener,
            self.router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!(event = %Event::ShutdownComplete);
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!(event = %Event::ShutdownStart);
}

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde::Serialize;
use tasknest_core::config::{AuthConfig, GatewayConfig};
use tasknest_core::error::Result;
use tasknest_core::{OwnerStrategy, Services, Store};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::auth::{auth_middleware, AuthMiddleware};
use super::response::ApiError;
use super::routes;
use super::tracing::tracing_middleware;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub strategy: Arc<OwnerStrategy>,
    pub store: Arc<dyn Store>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
}

/// Gateway HTTP server.
pub struct GatewayServer {
    config: GatewayConfig,
    auth: Arc<AuthMiddleware>,
    state: AppState,
}

impl GatewayServer {
    /// Create a new gateway server. Fails on an unsupported JWT algorithm.
    pub fn new(config: GatewayConfig, auth: &AuthConfig, store: Arc<dyn Store>) -> Result<Self> {
        let strategy = OwnerStrategy::from_config(auth);
        tracing::info!(strategy = strategy.as_str(), "Owner resolution configured");

        Ok(Self {
            config,
            auth: Arc::new(AuthMiddleware::from_config(auth)?),
            state: AppState {
                services: Services::new(store.clone()),
                strategy: Arc::new(strategy),
                store,
            },
        })
    }

    fn cors(&self) -> CorsLayer {
        if self.config.cors_origins.iter().any(|o| o == "*") {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = self
                .config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }

    /// Build the Axum router.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .merge(routes::router())
            .fallback(fallback_handler)
            .with_state(self.state.clone())
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn(tracing_middleware))
                    .layer(TraceLayer::new_for_http())
                    .layer(self.cors())
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::REQUEST_TIMEOUT,
                        Duration::from_secs(self.config.request_timeout_secs),
                    ))
                    .layer(middleware::from_fn_with_state(
                        self.auth.clone(),
                        auth_middleware,
                    )),
            )
    }

    /// Address to bind to, as `host:port`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, shutdown: F) -> std::result::Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.addr();
        let router = self.router();

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!(
            "Gateway server listening on {}",
            listener.local_addr().map(|a| a.to_string()).unwrap_or(addr)
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

/// Health check handler. 503 when the store is unreachable.
async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status) = match state.store.health_check().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            backend: state.store.backend().to_string(),
        }),
    )
}

async fn fallback_handler() -> ApiError {
    ApiError::not_found()
}

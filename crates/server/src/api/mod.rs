pub mod caller;
pub mod dispatch;
pub mod health;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use actroute_core::PermissionSet;
use actroute_router::Dispatcher;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{PermissionsConfig, ServerConfig};

pub use caller::CallerPermissions;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The dispatch pipeline over the immutable route table.
    pub dispatcher: Dispatcher,
    /// How caller grants are read from requests.
    pub permissions: Arc<PermissionsConfig>,
    /// Tokens granted to every caller, parsed once from `permissions`.
    pub anonymous: Arc<PermissionSet>,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
    /// Whether the permissive CORS layer is installed.
    pub cors: bool,
}

impl AppState {
    /// State with no permission sources and the default request limits.
    pub fn new(dispatcher: Dispatcher) -> Self {
        let defaults = ServerConfig::default();
        Self {
            dispatcher,
            permissions: Arc::new(PermissionsConfig::default()),
            anonymous: Arc::new(PermissionSet::new()),
            request_timeout: Duration::from_secs(defaults.request_timeout_seconds),
            max_body_bytes: defaults.max_body_bytes,
            cors: defaults.cors,
        }
    }

    #[must_use]
    pub fn with_permissions(mut self, config: PermissionsConfig) -> Self {
        self.anonymous = Arc::new(config.anonymous.iter().map(String::as_str).collect());
        self.permissions = Arc::new(config);
        self
    }

    /// Apply the request limits and CORS switch from the `[server]`
    /// section.
    #[must_use]
    pub fn with_limits(mut self, server: &ServerConfig) -> Self {
        self.request_timeout = Duration::from_secs(server.request_timeout_seconds);
        self.max_body_bytes = server.max_body_bytes;
        self.cors = server.cors;
        self
    }
}

/// Build the Axum router: introspection endpoints plus a fallback that runs
/// every other request through the dispatch pipeline.
pub fn router(state: AppState) -> Router {
    let request_timeout = state.request_timeout;
    let max_body_bytes = state.max_body_bytes;
    let cors = state.cors;

    let router = Router::new()
        .route("/health", get(health::health))
        .route("/routes", get(routes::list_routes))
        .fallback(dispatch::dispatch)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(timeout_layer(request_timeout))
        .layer(TraceLayer::new_for_http());

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

#[allow(deprecated)]
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::new(timeout)
}

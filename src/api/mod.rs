//! Admin HTTP API.
//!
//! # Data Flow
//! ```text
//! Request → TraceLayer → TimeoutLayer → api_key_middleware (Bearer)
//!     → handler → VirtualHostManager
//!     → 2xx JSON | ApiError { code, message } with status from the error category
//! ```
//!
//! # Design Decisions
//! - `/admin/status` sits behind the same key as the mutation routes
//! - Request bodies use the engine's wire shapes, so validation errors surface
//!   before the manager is called

pub mod auth;
pub mod error;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::vhost::VirtualHostManager;

use self::auth::api_key_middleware;
use self::handlers::*;

/// Shared state of the admin API.
#[derive(Clone)]
pub struct ApiState {
    pub manager: Arc<VirtualHostManager>,
    pub api_key: Arc<str>,
}

impl ApiState {
    pub fn new(manager: Arc<VirtualHostManager>, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            manager,
            api_key: api_key.into(),
        }
    }
}

pub fn router(state: ApiState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/v1/vhosts", get(list_vhosts).post(create_vhost))
        .route("/v1/vhosts/{hostname}", delete(delete_vhost))
        .route("/v1/vhosts/mappings", post(create_mapping))
        .route("/v1/services", get(list_services))
        .layer(middleware::from_fn_with_state(state.clone(), api_key_middleware))
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
}

/// Wait for Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

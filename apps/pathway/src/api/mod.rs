//! # Pathway HTTP API Module
//!
//! The HTTP storage API the workflow editor saves to and loads from.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /kinds` - Node types, exercise kinds and condition kinds
//! - `GET /workflows` - Stored workflow ids
//! - `GET /workflows/{id}` - Stored document
//! - `PUT /workflows/{id}` - Validate and store a document
//! - `POST /validate` - Validate a document without storing it
//! - `GET /workflows/{id}/hash` - Checksum and BLAKE3 digest
//!
//! ## Security Configuration
//!
//! See `config`: CORS origins, rate limit and API key come from
//! `[server]` in `pathway.toml` or the `PATHWAY_*` environment variables.

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{ApiKey, keys_match};
pub use handlers::{ApiError, status_for};
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::{
    ErrorResponse, FieldJson, HashResponse, HealthResponse, KindsResponse, NodeTypeJson,
    SaveResponse, ValidateResponse, WorkflowListResponse,
};

use crate::config::ServerConfig;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use pathway_core::{PathwayError, Store};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (2 MiB).
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// The persistence backend.
    pub store: Arc<RwLock<Store>>,
    /// Security and network settings.
    pub settings: Arc<ServerConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Store, settings: ServerConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            settings: Arc::new(settings),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer.
///
/// - `None`: localhost only
/// - `["*"]`: every origin (development only)
/// - otherwise: the listed origins; invalid entries are skipped
fn build_cors_layer(origins: Option<&[String]>) -> CorsLayer {
    let Some(origins) = origins else {
        tracing::info!("CORS: No origins configured, defaulting to localhost only");
        return build_localhost_cors();
    };

    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(hv) => {
                tracing::info!("CORS: Allowing origin: {}", origin);
                Some(hv)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
        build_localhost_cors()
    } else {
        restricted_cors(allowed)
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();
    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
/// 5. Authentication (if an API key is configured)
pub fn create_router(state: AppState) -> Router {
    let settings = Arc::clone(&state.settings);

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/kinds", get(handlers::kinds_handler))
        .route("/workflows", get(handlers::list_handler))
        .route(
            "/workflows/{id}",
            get(handlers::get_workflow_handler).put(handlers::put_workflow_handler),
        )
        .route("/workflows/{id}/hash", get(handlers::hash_handler))
        .route("/validate", post(handlers::validate_handler));

    if let Some(key) = settings.api_key() {
        tracing::info!("API key authentication enabled");
        let key: ApiKey = Arc::from(key);
        router = router.layer(axum_middleware::from_fn_with_state(
            key,
            auth::api_key_auth_middleware,
        ));
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set PATHWAY_API_KEY to enable authentication."
        );
    }

    match create_rate_limiter(settings.rate_limit) {
        Some(limiter) => {
            tracing::info!("Rate limiting enabled: {} requests/second", settings.rate_limit);
            router = router.layer(axum_middleware::from_fn_with_state(
                limiter,
                middleware::rate_limit_middleware,
            ));
        }
        None => tracing::info!("Rate limiting disabled"),
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(settings.cors_origins.as_deref()))
                .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and run until Ctrl+C.
pub async fn run_server(state: AppState) -> Result<(), PathwayError> {
    let addr = state.settings.bind_addr();
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PathwayError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Pathway HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| PathwayError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            // Without a signal handler the server runs until killed
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all API endpoints
//! - Middleware stack (auth, logging, compression, error envelopes)
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::middleware::{api_key_auth, error_path, log_requests, request_id};
use crate::routes::{api_info, health, huggingface, not_found, pinecone};
use crate::state::ServerState;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post};
use axum::Router;
use docsearch::DocsearchConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// Routes are divided into:
/// - Public routes: /, /health, /ready (no auth required)
/// - Protected routes: /pinecone/* and /huggingface/* (API key required when keys are configured)
///
/// Middleware stack (outermost first):
/// 1. Tracing
/// 2. Request logging
/// 3. Request ID tracking
/// 4. CORS
/// 5. Compression
/// 6. Timeout handling
/// 7. Body size limit
/// 8. Error path stamping
/// 9. API key authentication (protected routes only)
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let public_routes = Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check));

    let protected_routes = Router::new()
        // Search and storage
        .route("/pinecone/search", post(pinecone::search))
        .route("/pinecone/store-text", post(pinecone::store_text))
        // Vector CRUD
        .route("/pinecone/upsert", post(pinecone::upsert))
        .route("/pinecone/fetch", post(pinecone::fetch))
        .route("/pinecone/vectors", delete(pinecone::delete_vectors))
        // Diagnostics
        .route("/pinecone/index/stats", get(pinecone::index_stats))
        .route("/pinecone/namespaces", get(pinecone::namespaces))
        .route("/pinecone/health", get(pinecone::health))
        // Feature extraction
        .route(
            "/huggingface/extract-features",
            post(huggingface::extract_features),
        )
        .layer(from_fn_with_state(state.clone(), api_key_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(from_fn(error_path))
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(request_id))
        .layer(from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Load embedding and vector store settings.
///
/// Reads the YAML file named by `config_path` when set, environment variables otherwise.
/// Environment variables override file values in both cases.
pub fn load_app_config(config: &ServerConfig) -> anyhow::Result<DocsearchConfig> {
    let app = match &config.config_path {
        Some(path) => DocsearchConfig::from_file(path)?,
        None => DocsearchConfig::from_env()?,
    };
    Ok(app)
}

/// Start the docsearch HTTP server
///
/// Blocks until the server is shut down via SIGTERM or Ctrl+C.
///
/// # Example
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
///
/// Services whose configuration is missing are left uninitialized. The server still
/// starts; their routes answer 500 and `/ready` reports 503.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    let app_config = load_app_config(&config)?;
    let state = Arc::new(ServerState::initialize(config.clone(), &app_config).await);

    let app = build_router(state);
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        "Starting docsearch server on {} with {} API keys",
        addr,
        config.api_keys.len()
    );
    tracing::info!(
        "Timeout: {}s, Max body: {}MB",
        config.timeout_secs,
        config.max_body_size_mb
    );
    tracing::info!(
        "Rate limit: {} requests/minute, CORS: {}",
        config.rate_limit_per_minute,
        config.enable_cors
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}

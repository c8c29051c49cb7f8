//! # Server Setup
//!
//! Server initialization, route registration, and HTTP server startup.
//!
//! [`start_server`] wires logging, configuration and the database, then serves
//! the router built by [`create_router`]. Tests build the same router over an
//! in-memory database.

// region: --- Imports
use axum::{
    extract::FromRef,
    http::{header, HeaderValue, Method, Request, Response},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use lib_core::{create_pool, run_migrations, AppError, Config, DbPool};
use std::time::Duration;
use tower_http::{classify::ServerErrorsFailureClass, cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Span};

use crate::handlers;
use crate::middleware::{log_requests, require_auth, stamp_req, RequestStamp};
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
// endregion: --- AppState

// region: --- Server Configuration
/// Listener and CORS settings, supplied by the binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3001")
    pub bind_address: String,
    /// Allowed CORS origins
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3001".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}
// endregion: --- Server Configuration

// region: --- Server Setup
fn init_tracing() {
    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    let level = match log_level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => log_level.as_str(),
        _ => "info",
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .with_target(true)
        .with_line_number(true)
        .finish();

    // A subscriber may already be installed (e.g. by an embedding binary).
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        info!("Log level: {}", level);
    }
}

/// Create the parent directory of a file-backed SQLite database.
fn ensure_database_dir(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            info!("Created database directory: {:?}", parent);
        }
    }

    Ok(())
}

/// Initialize and start the HTTP server.
///
/// # Errors
///
/// Fails if configuration is missing or invalid, the database cannot be
/// opened or migrated, or the listener cannot bind.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("CRACOUCHAT SERVER STARTING");

    info!("Loading configuration...");
    let app_config = Config::from_env().map_err(AppError::Config)?;
    app_config.validate().map_err(AppError::Config)?;
    info!("{:?}", app_config);

    ensure_database_dir(&app_config.database_url)?;

    info!("Connecting to database...");
    let pool = create_pool(&app_config.database_url).await?;

    info!("Running database migrations...");
    run_migrations(&pool).await?;
    info!("Migrations complete");

    let state = AppState {
        db: pool,
        config: app_config,
    };

    let app = create_router(state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    info!("SERVER READY: http://{}", config.bind_address);
    log_server_info();

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the application router with all routes and middleware.
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let protected = Router::new()
        .route(
            "/api/conversations",
            get(handlers::conversations::list_conversations)
                .post(handlers::conversations::create_conversation)
                .head(handlers::method_not_allowed)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/messages",
            get(handlers::messages::list_messages)
                .post(handlers::messages::send_message)
                .head(handlers::method_not_allowed)
                .fallback(handlers::method_not_allowed),
        )
        .route("/api/auth/session", get(handlers::auth::session))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    // Layers run outermost-last: cors, stamp_req, trace span, log_requests.
    Router::new()
        .route("/api/auth/callback", post(handlers::auth::sign_in))
        .route("/health", get(|| async { "OK" }))
        .merge(protected)
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(from_fn(log_requests))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        request_id = %RequestStamp::id_of(request),
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_response(|_response: &Response<_>, _latency: Duration, _span: &Span| {
                    // Response logging is handled by log_requests.
                })
                .on_failure(|error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                    tracing::error!(
                        error = ?error,
                        latency_ms = latency.as_millis(),
                        "[HTTP FAILURE] {:?}",
                        error
                    );
                }),
        )
        .layer(from_fn(stamp_req))
        .layer(cors)
}

fn log_server_info() {
    info!(" AUTH:");
    info!("   • POST /api/auth/callback   (identity gateway)");
    info!("   • GET  /api/auth/session");
    info!(" CONVERSATIONS:");
    info!("   • GET  /api/conversations");
    info!("   • POST /api/conversations   {{\"participantEmail\": ...}}");
    info!(" MESSAGES:");
    info!("   • GET  /api/messages?conversationId={{id}}");
    info!("   • POST /api/messages        {{\"conversationId\": ..., \"content\": ...}}");
    info!(" HEALTH:");
    info!("   • GET  /health");
}
// endregion: --- Server Setup

//! HTTP server setup and lifecycle.
//!
//! Owns the process-wide upstream session (connection pool + credential
//! handle), wires the prediction route, and serves until shutdown.

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::{MetadataTokenProvider, StaticTokenProvider, TokenProvider};
use crate::config::Settings;
use crate::gemini::GeminiClient;

/// Upper bound on idle upstream connections kept in the pool.
const POOL_MAX_IDLE_PER_HOST: usize = 1000;

/// Correlation ID attached to every inbound request.
#[derive(Debug, Clone)]
pub struct RequestId(pub Uuid);

/// Shared application state. One upstream session for the process lifetime,
/// used read-only by concurrent requests.
#[derive(Clone)]
pub struct AppState {
    pub gemini: Arc<GeminiClient>,
}

/// Create the axum router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(middleware::from_fn(attach_request_id))
        .layer(TraceLayer::new_for_http())
}

/// Generate a correlation ID, expose it to handlers, and echo it back on
/// the response.
async fn attach_request_id(mut request: Request, next: Next) -> Response {
    let id = RequestId(Uuid::new_v4());
    request.extensions_mut().insert(id.clone());

    let mut response = next.run(request).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&id.0.to_string()).unwrap(),
    );
    response
}

/// Build the upstream session from settings: the connection pool, the
/// credential handle, and the Gemini client that owns both.
pub fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    let http = reqwest::Client::builder()
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let tokens: Arc<dyn TokenProvider> = match &settings.access_token {
        Some(token) => {
            tracing::info!("Using fixed access token from environment");
            Arc::new(StaticTokenProvider::new(token.clone()))
        }
        None => Arc::new(MetadataTokenProvider::new(http.clone())),
    };

    let gemini = Arc::new(GeminiClient::new(settings, http, tokens));
    Ok(AppState { gemini })
}

/// Run the HTTP server until shutdown.
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let state = build_state(&settings)?;
    tracing::info!(url = %state.gemini.url(), "Upstream session ready");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Starting gemini-relay server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Dropping the state here releases the connection pool and credential
    // handle.
    tracing::info!("Server stopped, upstream session released");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

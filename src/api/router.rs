//! API router configuration.

use std::future::{Future, IntoFuture};

use axum::{
    routing::{any, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{api_info, get_navigation, get_profile, health, sign_in, sign_out, AppState};
use super::websocket::navigation_ws_handler;
use crate::error::GateError;

/// Create the API router with the given state.
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/sign-in", post(sign_in))
        .route("/sign-out", post(sign_out));

    let api_v1 = Router::new()
        .route("/", get(api_info))
        .route("/navigation", get(get_navigation))
        .route("/navigation/ws", any(navigation_ws_handler))
        .route("/profile", get(get_profile))
        .nest("/auth", auth_routes);

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_v1)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Drain in-flight requests on shutdown.
    pub graceful_shutdown: bool,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            graceful_shutdown: true,
        }
    }

    pub fn without_graceful_shutdown(mut self) -> Self {
        self.graceful_shutdown = false;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 3000)
    }
}

/// Serve the API until `shutdown` resolves.
pub async fn serve<F>(config: ServerConfig, state: AppState, shutdown: F) -> crate::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.bind_address();
    let router = create_router(state);

    tracing::info!("Starting session-gate API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(GateError::Io)?;

    if config.graceful_shutdown {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(GateError::Io)?;
    } else {
        tokio::select! {
            result = axum::serve(listener, router).into_future() => result.map_err(GateError::Io)?,
            () = shutdown => tracing::info!("API server stopped without draining"),
        }
    }

    Ok(())
}

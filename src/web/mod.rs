//! Web server module.

mod handlers;

pub use handlers::*;

use crate::config::ServerConfig;
use crate::db::Store;
use crate::probe::HttpProber;
use crate::scheduler::Scheduler;

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub scheduler: Arc<Scheduler<HttpProber>>,
}

/// JSON API over the running monitors.
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(config: ServerConfig, store: Store, scheduler: Arc<Scheduler<HttpProber>>) -> Self {
        Self {
            config,
            state: AppState { store, scheduler },
        }
    }

    /// Build the router with all routes.
    pub fn routes(state: AppState) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

        Router::new()
            .route(
                "/api/endpoints",
                get(handlers::handle_get_endpoints).post(handlers::handle_create_endpoint),
            )
            .route(
                "/api/endpoints/{id}",
                get(handlers::handle_get_endpoint).delete(handlers::handle_delete_endpoint),
            )
            .route("/api/stats", get(handlers::handle_get_stats))
            .route("/api/alerts", get(handlers::handle_get_alerts))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(64 * 1024))
            .with_state(state)
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let router = Self::routes(self.state.clone());

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}

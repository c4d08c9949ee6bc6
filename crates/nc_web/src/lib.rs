use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use nc_core::{Error, Result};
use tower_http::cors::CorsLayer;
use tracing::info;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/articles", get(handlers::list_articles))
        .route("/api/articles/search", get(handlers::search_articles))
        .route("/api/clusters", post(handlers::cluster_articles))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Serve the API on `addr` until the process exits.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_app(state))
        .await
        .map_err(Error::Io)
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState};
    pub use nc_core::{Article, Error, Result};
}

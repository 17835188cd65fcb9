mod handlers;
mod state;

use axum::Router;
use axum::routing::get;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::destination::DestinationResolver;
use crate::destination::types::{ResolveError, Result};

pub fn build_router(resolver: Arc<DestinationResolver>) -> Router {
    let state = Arc::new(AppState { resolver });

    Router::new()
        .route("/api/resolve", get(handlers::resolve))
        .route("/api/suggest", get(handlers::suggest))
        .route("/api/destinations", get(handlers::destinations))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, resolver: Arc<DestinationResolver>) -> Result<()> {
    let app = build_router(resolver);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ResolveError::Config(format!("cannot bind to {}: {}", addr, e)))?;

    tracing::info!(%addr, "waypoint server listening");
    eprintln!("  Waypoint server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app).await?;
    Ok(())
}

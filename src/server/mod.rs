//! JSON HTTP API in front of the resolver, for browser map front-ends.

mod handlers;
mod state;

use axum::routing::get;
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::geocode::AddressResolver;

pub fn build_router(resolver: AddressResolver) -> Router {
    let state = Arc::new(AppState { resolver });

    Router::new()
        .route("/api/resolve", get(handlers::resolve))
        .route("/api/config", get(handlers::config))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, resolver: AddressResolver) -> std::io::Result<()> {
    let app = build_router(resolver);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("massgeo server listening on http://{}", addr);
    eprintln!("  massgeo server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app).await
}

//! AlumNet Gateway - story analysis endpoints and the alumni backend proxy.
//!
//! This crate provides the HTTP service in front of the AlumNet platform:
//! - Story analysis (multipart with image, text-only, publish, feed batch),
//!   all backed by the shared pipeline in `alumnet-insight`
//! - A transparent proxy to the alumni backend with `Authorization`
//!   passthrough
//!
//! ## Architecture
//!
//! ```text
//! Client → Gateway ── /api/v1/stories/* ──→ Analyzer → hosted models → fallback
//!                 └── /api/v1/backend/* ──→ Alumni backend API
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod proxy;
pub mod routes;

pub use proxy::ProxyState;
pub use routes::{build_all_routes, AppState, ErrorResponse, HealthResponse};

use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use alumnet_common::config::Config;

/// Build the gateway router with all routes and middleware.
pub fn build_router(config: &Config) -> Router {
    // The web frontend calls these endpoints from the browser; CORS stays permissive
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    build_all_routes(config).layer(cors)
}

/// Start the gateway server.
pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let addr = SocketAddr::from((
        config.network.bind.parse::<std::net::IpAddr>()?,
        config.gateway.port,
    ));

    let router = build_router(config);

    tracing::info!("Starting AlumNet Gateway on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

mod error;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use pricedesk_core::PriceService;
use pricedesk_store::MemoryStore;

use crate::state::AppState;

/// Price API server for the pricedesk dashboard.
#[derive(Debug, Parser)]
#[command(name = "pricedesk", version, about)]
struct Args {
    /// Address to bind the HTTP listener to.
    #[arg(long, default_value = "127.0.0.1:8787")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let state = AppState::new(PriceService::from_env(), Arc::new(MemoryStore::new()));

    let app = routes::api_router()
        .layer(CorsLayer::permissive())
        .with_state(state);

    tracing::info!("pricedesk listening on http://{}", args.bind);

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .expect("bind address should be available");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server should start");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received, stopping");
}

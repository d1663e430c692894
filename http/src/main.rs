use std::net::SocketAddr;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coda_client::CodaClient;
use coda_core::config::{self, API_KEY_HELP_URL};
use coda_mcp_runtime::McpServer;

mod routes;
mod session;
mod state;

use state::AppState;

pub(crate) fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::info::router())
        .merge(routes::health::router())
        .merge(routes::sse::router())
        .merge(routes::mcp::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coda_mcp_http=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let api_key = match config::resolve_api_key(None) {
        Ok(key) => key,
        Err(err) => {
            eprintln!("Error: {err}");
            eprintln!("Get your Coda API key from: {API_KEY_HELP_URL}");
            std::process::exit(1);
        }
    };

    let api_url = std::env::var("CODA_API_URL").ok();
    let client = match CodaClient::new(api_key, api_url.as_deref()) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };

    let state = AppState {
        server: McpServer::new(client),
        sse: session::SseSessions::default(),
        streamable: session::StreamableSessions::default(),
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Coda MCP HTTP server listening on {}", addr);
    tracing::info!(
        event = "http_transports_ready",
        mcp = %format!("http://{addr}/mcp"),
        sse = %format!("http://{addr}/sse"),
        health = %format!("http://{addr}/health"),
        "Streamable HTTP and SSE transports ready"
    );

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .unwrap();
}

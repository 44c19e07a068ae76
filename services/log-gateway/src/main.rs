pub mod features;
pub mod services;

use std::net::SocketAddr;

use axum::{
    Json, Router, http,
    routing::get,
};
use serde_json::json;
use shared::{
    services::redis::Redis,
    utilities::{config::Config, errors::AppError},
};
use time::macros::format_description;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, fmt::time::LocalTime, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::features::websocket;
use crate::services::rooms::RoomRegistry;
use crate::services::subscriber::run_log_subscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install crypto provider
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load .env file
    match dotenvy::dotenv() {
        Ok(path) => {
            println!("Loaded .env file from {}", path.display());
        }
        Err(dotenvy::Error::Io(ref err)) if err.kind() == std::io::ErrorKind::NotFound => {
            println!(".env file not found, continuing without it");
        }
        Err(e) => {
            println!("Couldn't load .env file: {}", e);
        }
    }

    // Initialize config
    let config = Config::init().await?;

    // Initialize tracing
    let filter =
        EnvFilter::new("log_gateway=debug,shared=debug,tower_http=warn,hyper=warn,reqwest=warn");
    let timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(timer),
        )
        .init();

    info!("🚀 Starting log-gateway");

    // Initialize services
    let redis = Redis::new(&config).await?;
    let rooms = RoomRegistry::new();

    info!("📨 Starting broker subscription");
    let subscriber_handle = tokio::spawn(run_log_subscriber(redis, rooms.clone()));

    let server_handle = tokio::spawn(start_gateway_server(
        config.gateway_address.clone(),
        rooms,
    ));

    tokio::select! {
        _ = shutdown_signal() => {
            info!("🛑 Shutdown signal received");
        }
        result = subscriber_handle => {
            match result {
                Ok(Ok(())) => info!("Broker subscription ended"),
                Ok(Err(e)) => info!("Broker subscription error: {}", e),
                Err(e) => info!("Broker subscription panicked: {}", e),
            }
        }
        result = server_handle => {
            match result {
                Ok(Ok(())) => info!("Gateway server stopped"),
                Ok(Err(e)) => info!("Gateway server error: {}", e),
                Err(e) => info!("Gateway server panicked: {}", e),
            }
        }
    }

    info!("👋 Log gateway shutting down");

    Ok(())
}

async fn start_gateway_server(address: String, rooms: RoomRegistry) -> Result<(), AppError> {
    let tracing_layer = TraceLayer::new_for_http()
        .on_request(|request: &http::Request<_>, _span: &tracing::Span| {
            info!("{} {}", request.method(), request.uri());
        })
        .on_response(DefaultOnResponse::new().level(tracing::Level::INFO));

    let app = Router::new()
        .route("/ws", get(websocket::ws_logs))
        .route(
            "/health",
            get(|| async {
                Json(json!({
                    "status": "healthy",
                    "service": "log-gateway"
                }))
            }),
        )
        .layer(CorsLayer::permissive())
        .layer(tracing_layer)
        .with_state(rooms);

    info!("🔌 Log gateway running at {}", address);

    let listener = tokio::net::TcpListener::bind(&address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

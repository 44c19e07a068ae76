pub mod features;
pub mod services;
pub mod utilities;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router, http,
    routing::{get, post},
};
use shared::{
    services::{kubernetes::Kubernetes, redis::Redis},
    utilities::config::Config,
};
use time::macros::format_description;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, fmt::time::LocalTime, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::features::handlers;
use crate::services::backend::ApiBackend;
use crate::services::cluster::KubeCluster;
use crate::services::notifier::WebhookNotifier;
use crate::services::publisher::RedisPublisher;
use crate::services::run::{Orchestrator, OrchestratorSettings};
use crate::utilities::app_state::AppState;

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
    let filter = EnvFilter::new(
        "build_orchestrator=debug,shared=debug,tower_http=warn,hyper=warn,reqwest=warn",
    );
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

    info!("🚀 Starting build-orchestrator");

    // Initialize services
    let kubernetes = Kubernetes::new(&config).await?;
    let redis = Redis::new(&config).await?;
    let http_client = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(KubeCluster {
            client: kubernetes.client,
        }),
        Arc::new(RedisPublisher {
            connection: redis.connection,
        }),
        Arc::new(ApiBackend {
            http: http_client.clone(),
            endpoint: config.api_endpoint.clone(),
            api_key: config.api_key.clone(),
        }),
        Arc::new(WebhookNotifier {
            http: http_client,
            webhook_url: config.notify_webhook_url.clone(),
        }),
        OrchestratorSettings::from_config(&config),
    ));

    let state = AppState { orchestrator };

    let tracing_layer = TraceLayer::new_for_http()
        .on_request(|request: &http::Request<_>, _span: &tracing::Span| {
            info!("{} {}", request.method(), request.uri());
        })
        .on_response(DefaultOnResponse::new().level(tracing::Level::INFO));

    let app = Router::new()
        .route("/jobs", post(handlers::submit_job))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .layer(tracing_layer)
        .with_state(state);

    info!("🛠️ Build orchestrator running at {}", config.server_address);
    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("👋 Build orchestrator shutting down");

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

use std::sync::Arc;

use anyhow::Context;
use axum::http::{Method, header::CONTENT_TYPE};
use tower_http::cors::{Any, CorsLayer};

use skillroute::api::{ApiState, api_routes};
use skillroute::config::AppConfig;
use skillroute::generator::MockPathGenerator;
use skillroute::onboarding::Wizard;
use skillroute::store::{AppStore, FileStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env();
    config.validate()?;

    eprintln!("SkillRoute v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Data: {}", config.data_dir.display());
    eprintln!("   API:  http://0.0.0.0:{}/api", config.port);
    eprintln!("   WS:   ws://0.0.0.0:{}/ws", config.port);

    // ── Store ───────────────────────────────────────────────────────────
    let storage = Arc::new(FileStorage::new(&config.data_dir));
    let store = AppStore::open(storage).await;

    // ── Generation ──────────────────────────────────────────────────────
    let generator = Arc::new(MockPathGenerator::new(config.generation.latency));
    let wizard = Arc::new(Wizard::new(store, generator, config.generation));

    // ── Server ──────────────────────────────────────────────────────────
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([CONTENT_TYPE]);

    let app = api_routes(ApiState::new(wizard, config.today_task_limit)).layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "SkillRoute server started");
    axum::serve(listener, app).await?;

    Ok(())
}

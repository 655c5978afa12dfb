//! Debate Arena - two sides of an AI argument, moderated
//!
//! A Rust backend that drives timed AI-vs-AI debates over a completion
//! endpoint and streams them to a browser page.

mod api;
mod completion;
mod config;
mod debate;
mod display;
mod runtime;

use api::{create_router, validate_page, AppState, PageError};
use completion::{CompletionError, CompletionService, HttpCompletionService, LoggingService};
use config::{AppConfig, ConfigError, DebateConfig};
use debate::DebateContext;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Anything that stops the server from coming up
#[derive(Debug, Error)]
enum StartupError {
    #[error("Invalid debate configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Debate page unusable: {0}")]
    Page(#[from] PageError),
    #[error("Cannot build completion client: {0}")]
    Client(#[from] CompletionError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debate_arena=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let app_config = AppConfig::from_env();

    let debate_config = DebateConfig::preset(&app_config.variant)?;
    debate_config.validate()?;

    // The page script refuses to run without these
    validate_page().inspect_err(|e| tracing::error!(error = %e, "Debate page check failed"))?;

    let http = HttpCompletionService::new(&app_config.endpoint, app_config.request_timeout)?
        .with_api_key(app_config.api_key.clone())
        .with_model(app_config.model.clone());
    let service: Arc<dyn CompletionService> = Arc::new(LoggingService::new(Arc::new(http)));

    tracing::info!(
        variant = %debate_config.variant,
        topics = debate_config.topics.len(),
        exchange_threshold = debate_config.exchange_threshold,
        endpoint = %service.endpoint(),
        model = ?app_config.model,
        request_timeout = ?app_config.request_timeout,
        "Debate configured"
    );
    if app_config.api_key.is_none() {
        tracing::warn!("No DEBATE_API_KEY set; requests are sent without authorization");
    }

    let context = DebateContext::new(debate_config);
    let config = context.config.clone();
    let debate = runtime::spawn(context, service);
    let state = AppState::new(debate, config);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], app_config.port));
    tracing::info!("Debate Arena listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

mod analysis;
mod config;
mod errors;
mod extraction;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::analysis::chain::ProviderChain;
use crate::analysis::orchestrator::Analyzer;
use crate::config::{Config, ProviderSettings};
use crate::extraction::{LopdfParser, TextExtractor};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; provider keys are optional
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Analyzer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize provider chain
    let llm = LlmClient::new(config.providers.request_timeout)?;
    let chain = ProviderChain::from_config(&llm, &config.providers);
    if config.providers.is_empty() {
        warn!("No analysis provider configured; set GEMINI_API_KEY or OPENROUTER_API_KEY");
    } else {
        info!(
            "Provider chain: primary={}, secondary={}",
            describe(config.providers.primary.as_ref()),
            describe(config.providers.secondary.as_ref())
        );
    }

    // Initialize text extraction
    let extractor = TextExtractor::new(Arc::new(LopdfParser));

    // Build app state
    let state = AppState {
        analyzer: Arc::new(Analyzer::new(extractor, chain)),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn describe(settings: Option<&ProviderSettings>) -> String {
    settings
        .map(|s| format!("{} ({})", s.kind, s.model))
        .unwrap_or_else(|| "none".to_string())
}

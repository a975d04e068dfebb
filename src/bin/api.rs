use margin_assistant::{
    api::start_server,
    config::AssistantConfig,
    exchange::{ExchangeState, HttpRateSource, RateSource},
    session::{spawn_refresher, SessionStore},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AssistantConfig::from_env()?;

    info!("🚀 Margin Assistant - API Server");
    info!("📍 Port: {}", config.port);
    info!("💱 Rate source: {}", config.rate_source_url);

    let seed = ExchangeState::with_rates(config.fallback_cad_to_usd, config.fallback_usd_to_cad);
    let sessions = Arc::new(SessionStore::with_limits(seed, config.sessions));

    let source: Arc<dyn RateSource> = Arc::new(HttpRateSource::new(
        config.rate_source_url.clone(),
        config.rate_timeout,
    )?);
    let refresher = spawn_refresher(
        sessions.clone(),
        source,
        config.rate_refresh_interval,
        config.rate_timeout,
    );

    info!("📡 Starting API server...");

    let result = start_server(sessions, config.port).await;
    refresher.abort();
    result?;

    Ok(())
}

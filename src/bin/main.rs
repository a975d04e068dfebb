use margin_assistant::{
    chat,
    config::AssistantConfig,
    exchange::{self, ExchangeState, HttpRateSource},
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Logs go to stderr so answers stay clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = AssistantConfig::from_env()?;
    let state = Arc::new(RwLock::new(ExchangeState::with_rates(
        config.fallback_cad_to_usd,
        config.fallback_usd_to_cad,
    )));

    // queries are answered with fallback rates until the fetch lands
    match HttpRateSource::new(config.rate_source_url.clone(), config.rate_timeout) {
        Ok(source) => {
            let state = state.clone();
            let timeout = config.rate_timeout;
            tokio::spawn(async move {
                if exchange::refresh(&source, &state, timeout).await {
                    info!("Market rate loaded");
                }
            });
        }
        Err(e) => warn!(error = %e, "Rate source unavailable, using fallback rates"),
    }

    let mut stdout = tokio::io::stdout();
    stdout.write_all(format!("{}\n\n> ", chat::WELCOME).as_bytes()).await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let reply = {
            let mut rates = state.write().await;
            chat::reply(&line, &mut rates)
        };

        if let Some(reply) = reply {
            stdout.write_all(format!("{}\n\n", reply.answer).as_bytes()).await?;
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    Ok(())
}

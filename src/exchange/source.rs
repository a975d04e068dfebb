//! Exchange rate source
//!
//! Fetches a live USD→CAD quote. Failures never reach the interpreter: the
//! caller logs them and keeps whatever rates it already had.

use super::ExchangeState;
use crate::error::AssistantError;
use crate::models::RateQuote;
use crate::Result;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Anything that can produce a market quote
#[async_trait::async_trait]
pub trait RateSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_rate(&self) -> Result<RateQuote>;
}

/// Rate source backed by an exchangerate JSON endpoint (`{"rates":{"CAD":…}}`)
pub struct HttpRateSource {
    client: Client,
    url: String,
}

impl HttpRateSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(2)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl RateSource for HttpRateSource {
    fn name(&self) -> &'static str {
        "exchangerate_http"
    }

    async fn fetch_rate(&self) -> Result<RateQuote> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            AssistantError::RateSource(format!("request to {} failed: {}", self.url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::RateSource(format!(
                "{} returned {}",
                self.url, status
            )));
        }

        let body: Value = response.json().await?;
        parse_quote(&body)
    }
}

/// Read `rates.CAD` from an exchangerate payload based on USD.
pub fn parse_quote(body: &Value) -> Result<RateQuote> {
    let cad = body
        .get("rates")
        .and_then(|rates| rates.get("CAD"))
        .and_then(Value::as_f64)
        .ok_or_else(|| AssistantError::RateSource("payload has no rates.CAD".to_string()))?;

    if !cad.is_finite() || cad <= 0.0 {
        return Err(AssistantError::InvalidRate(format!(
            "rates.CAD must be positive, got {}",
            cad
        )));
    }

    Ok(RateQuote::from_usd_to_cad(cad))
}

/// Fetch a quote within `timeout`. Any failure is logged and yields `None`.
pub async fn fetch_with_timeout(source: &dyn RateSource, timeout: Duration) -> Option<RateQuote> {
    match tokio::time::timeout(timeout, source.fetch_rate()).await {
        Ok(Ok(quote)) => {
            info!(
                source = source.name(),
                usd_to_cad = quote.usd_to_cad,
                "exchange rate fetched"
            );
            Some(quote)
        }
        Ok(Err(e)) => {
            warn!(source = source.name(), "exchange rate unavailable, keeping prior rates: {}", e);
            None
        }
        Err(_) => {
            warn!(source = source.name(), "exchange rate fetch timed out after {:?}, keeping prior rates", timeout);
            None
        }
    }
}

/// Refresh one state from `source`. Returns whether a quote was applied.
pub async fn refresh(
    source: &dyn RateSource,
    state: &RwLock<ExchangeState>,
    timeout: Duration,
) -> bool {
    let Some(quote) = fetch_with_timeout(source, timeout).await else {
        return false;
    };

    state.write().await.refresh_from_market(&quote);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use serde_json::json;

    struct FixedSource(f64);

    #[async_trait::async_trait]
    impl RateSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch_rate(&self) -> Result<RateQuote> {
            Ok(RateQuote::from_usd_to_cad(self.0))
        }
    }

    struct DownSource;

    #[async_trait::async_trait]
    impl RateSource for DownSource {
        fn name(&self) -> &'static str {
            "down"
        }

        async fn fetch_rate(&self) -> Result<RateQuote> {
            Err(AssistantError::RateSource("connection refused".to_string()))
        }
    }

    struct SlowSource;

    #[async_trait::async_trait]
    impl RateSource for SlowSource {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn fetch_rate(&self) -> Result<RateQuote> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(RateQuote::from_usd_to_cad(2.0))
        }
    }

    #[test]
    fn test_parse_quote() {
        let quote = parse_quote(&json!({"base": "USD", "rates": {"CAD": 1.25}})).unwrap();
        assert_eq!(quote.usd_to_cad, 1.25);
        assert_eq!(quote.cad_to_usd, 0.8);
    }

    #[test]
    fn test_parse_quote_rejects_bad_payloads() {
        assert!(parse_quote(&json!({"rates": {}})).is_err());
        assert!(parse_quote(&json!({"success": false})).is_err());
        assert!(matches!(
            parse_quote(&json!({"rates": {"CAD": 0}})),
            Err(AssistantError::InvalidRate(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_applies_quote() {
        let state = RwLock::new(ExchangeState::new());
        assert!(refresh(&FixedSource(1.25), &state, Duration::from_secs(1)).await);
        assert_eq!(state.read().await.rate(Direction::UsdToCad), 1.25);
    }

    #[tokio::test]
    async fn test_unavailable_source_keeps_prior_rates() {
        let state = RwLock::new(ExchangeState::new());
        assert!(!refresh(&DownSource, &state, Duration::from_secs(1)).await);
        assert_eq!(*state.read().await, ExchangeState::new());
    }

    #[tokio::test]
    async fn test_slow_source_times_out() {
        let state = RwLock::new(ExchangeState::new());
        assert!(!refresh(&SlowSource, &state, Duration::from_millis(100)).await);
        assert_eq!(state.read().await.rate(Direction::UsdToCad), 1.39);
    }

    #[test]
    fn test_blocking_fetch() {
        let quote = tokio_test::block_on(FixedSource(1.5).fetch_rate()).unwrap();
        assert_eq!(quote.usd_to_cad, 1.5);
    }
}

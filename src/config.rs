//! Runtime configuration from the environment
//!
//! Binaries call `dotenv::dotenv()` first so a local `.env` can supply values.

use crate::error::AssistantError;
use crate::exchange::{FALLBACK_CAD_TO_USD, FALLBACK_USD_TO_CAD};
use crate::session::SessionLimits;
use crate::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_RATE_SOURCE_URL: &str = "https://api.exchangerate.host/latest?base=USD&symbols=CAD";

#[derive(Debug, Clone, PartialEq)]
pub struct AssistantConfig {
    pub port: u16,
    pub rate_source_url: String,
    pub rate_timeout: Duration,
    /// Zero disables the periodic refresh
    pub rate_refresh_interval: Duration,
    pub fallback_usd_to_cad: f64,
    pub fallback_cad_to_usd: f64,
    pub sessions: SessionLimits,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            rate_source_url: DEFAULT_RATE_SOURCE_URL.to_string(),
            rate_timeout: Duration::from_secs(10),
            rate_refresh_interval: Duration::from_secs(3600),
            fallback_usd_to_cad: FALLBACK_USD_TO_CAD,
            fallback_cad_to_usd: FALLBACK_CAD_TO_USD,
            sessions: SessionLimits::default(),
        }
    }
}

impl AssistantConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT").or_else(|| lookup("API_PORT")) {
            Some(raw) => parse("PORT", &raw)?,
            None => defaults.port,
        };

        let rate_source_url = lookup("RATE_SOURCE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.rate_source_url);

        let rate_timeout = lookup("RATE_TIMEOUT_SECS")
            .map(|raw| parse::<u64>("RATE_TIMEOUT_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(defaults.rate_timeout);

        let rate_refresh_interval = lookup("RATE_REFRESH_SECS")
            .map(|raw| parse::<u64>("RATE_REFRESH_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(defaults.rate_refresh_interval);

        let fallback_usd_to_cad = lookup("FALLBACK_USD_TO_CAD")
            .map(|raw| parse_rate("FALLBACK_USD_TO_CAD", &raw))
            .transpose()?
            .unwrap_or(defaults.fallback_usd_to_cad);

        let fallback_cad_to_usd = lookup("FALLBACK_CAD_TO_USD")
            .map(|raw| parse_rate("FALLBACK_CAD_TO_USD", &raw))
            .transpose()?
            .unwrap_or(defaults.fallback_cad_to_usd);

        let max_sessions = lookup("SESSION_CAPACITY")
            .map(|raw| parse::<usize>("SESSION_CAPACITY", &raw))
            .transpose()?
            .unwrap_or(defaults.sessions.max_sessions);

        let idle_ttl = lookup("SESSION_IDLE_SECS")
            .map(|raw| parse::<u64>("SESSION_IDLE_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(defaults.sessions.idle_ttl);

        Ok(Self {
            port,
            rate_source_url,
            rate_timeout,
            rate_refresh_interval,
            fallback_usd_to_cad,
            fallback_cad_to_usd,
            sessions: SessionLimits {
                max_sessions,
                idle_ttl,
            },
        })
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AssistantError::Config(format!("{} = {:?}: {}", key, raw, e)))
}

fn parse_rate(key: &str, raw: &str) -> Result<f64> {
    let rate: f64 = parse(key, raw)?;
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(AssistantError::Config(format!("{} must be a positive rate, got {}", key, raw)))
    }
}

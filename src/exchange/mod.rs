//! Exchange state
//!
//! Holds the CAD↔USD rates for one session. A manual override set through
//! "set rate" supersedes every fetched rate until the state is dropped.

pub mod source;

pub use source::{refresh, HttpRateSource, RateSource};

use crate::models::{Direction, ExchangeSnapshot, RateQuote};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Seed rates used until a market quote arrives
pub const FALLBACK_CAD_TO_USD: f64 = 0.72;
pub const FALLBACK_USD_TO_CAD: f64 = 1.39;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ExchangeState {
    cad_to_usd: f64,
    usd_to_cad: f64,
    manual_override_rate: Option<f64>,
}

impl ExchangeState {
    pub fn new() -> Self {
        Self::with_rates(FALLBACK_CAD_TO_USD, FALLBACK_USD_TO_CAD)
    }

    pub fn with_rates(cad_to_usd: f64, usd_to_cad: f64) -> Self {
        Self {
            cad_to_usd,
            usd_to_cad,
            manual_override_rate: None,
        }
    }

    /// Apply a fetched quote. The override, if any, keeps precedence.
    pub fn refresh_from_market(&mut self, quote: &RateQuote) {
        self.usd_to_cad = quote.usd_to_cad;
        self.cad_to_usd = quote.cad_to_usd;
        debug!(
            usd_to_cad = quote.usd_to_cad,
            overridden = self.manual_override_rate.is_some(),
            "market rate applied"
        );
    }

    /// Record a USD→CAD override for the rest of the session.
    pub fn set_manual_rate(&mut self, usd_to_cad: f64) {
        self.manual_override_rate = Some(usd_to_cad);
        self.usd_to_cad = usd_to_cad;
        self.cad_to_usd = 1.0 / usd_to_cad;
    }

    /// Rate in force for `direction`
    pub fn rate(&self, direction: Direction) -> f64 {
        match (direction, self.manual_override_rate) {
            (Direction::UsdToCad, Some(rate)) => rate,
            (Direction::CadToUsd, Some(rate)) => 1.0 / rate,
            (Direction::UsdToCad, None) => self.usd_to_cad,
            (Direction::CadToUsd, None) => self.cad_to_usd,
        }
    }

    pub fn convert(&self, amount: f64, direction: Direction) -> f64 {
        amount * self.rate(direction)
    }

    pub fn cad_to_usd(&self) -> f64 {
        self.cad_to_usd
    }

    pub fn usd_to_cad(&self) -> f64 {
        self.usd_to_cad
    }

    pub fn manual_override_rate(&self) -> Option<f64> {
        self.manual_override_rate
    }

    pub fn snapshot(&self) -> ExchangeSnapshot {
        ExchangeSnapshot {
            cad_to_usd: self.cad_to_usd,
            usd_to_cad: self.usd_to_cad,
            manual_override_rate: self.manual_override_rate,
            effective_usd_to_cad: self.rate(Direction::UsdToCad),
            effective_cad_to_usd: self.rate(Direction::CadToUsd),
        }
    }
}

impl Default for ExchangeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_seed() {
        let state = ExchangeState::new();
        assert_eq!(state.rate(Direction::CadToUsd), 0.72);
        assert_eq!(state.rate(Direction::UsdToCad), 1.39);
        assert_eq!(state.manual_override_rate(), None);
    }

    #[test]
    fn test_manual_rate_sets_both_sides() {
        let mut state = ExchangeState::new();
        state.set_manual_rate(1.4);

        assert_eq!(state.manual_override_rate(), Some(1.4));
        assert_eq!(state.usd_to_cad(), 1.4);
        assert!((state.cad_to_usd() - 1.0 / 1.4).abs() < 1e-12);
        assert!((state.convert(100.0, Direction::UsdToCad) - 140.0).abs() < 1e-9);
    }

    #[test]
    fn test_override_survives_market_refresh() {
        let mut state = ExchangeState::new();
        state.set_manual_rate(1.5);
        state.refresh_from_market(&RateQuote::from_usd_to_cad(1.25));

        assert_eq!(state.usd_to_cad(), 1.25);
        assert_eq!(state.rate(Direction::UsdToCad), 1.5);
        assert!((state.convert(150.0, Direction::CadToUsd) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_market_refresh_without_override() {
        let mut state = ExchangeState::new();
        state.refresh_from_market(&RateQuote::from_usd_to_cad(1.25));

        assert_eq!(state.rate(Direction::UsdToCad), 1.25);
        assert_eq!(state.rate(Direction::CadToUsd), 0.8);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.effective_usd_to_cad, 1.25);
        assert_eq!(snapshot.manual_override_rate, None);
    }
}

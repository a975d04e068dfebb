//! Tiered pricing with a shipping allowance

use super::cents;
use crate::error::AssistantError;
use crate::formulas;
use crate::models::Currency;
use crate::Result;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TIER_A_MARGIN: f64 = 30.0;
pub const DEFAULT_TIER_BCW_MARGIN: f64 = 40.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricingRequest {
    pub cost: f64,
    #[serde(default = "default_currency")]
    pub currency: Currency,
    #[serde(default = "default_tier_a")]
    pub tier_a_margin: f64,
    #[serde(default = "default_tier_bcw")]
    pub tier_bcw_margin: f64,
}

fn default_currency() -> Currency {
    Currency::Cad
}

fn default_tier_a() -> f64 {
    DEFAULT_TIER_A_MARGIN
}

fn default_tier_bcw() -> f64 {
    DEFAULT_TIER_BCW_MARGIN
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricingQuote {
    pub currency: Currency,
    pub cost: f64,
    pub shipping: f64,
    pub total_cost: f64,
    pub price_a: f64,
    pub price_bcw: f64,
}

impl PricingRequest {
    pub fn new(cost: f64, currency: Currency) -> Self {
        Self {
            cost,
            currency,
            tier_a_margin: DEFAULT_TIER_A_MARGIN,
            tier_bcw_margin: DEFAULT_TIER_BCW_MARGIN,
        }
    }

    /// Shipping is a flat share of cost, higher for USD-sourced goods.
    pub fn shipping_rate(&self) -> f64 {
        match self.currency {
            Currency::Cad => 0.03,
            Currency::Usd => 0.04,
        }
    }

    pub fn quote(&self) -> Result<PricingQuote> {
        if !(self.cost > 0.0) {
            return Err(AssistantError::Calculation(format!(
                "cost must be positive, got {}",
                self.cost
            )));
        }

        let shipping = self.cost * self.shipping_rate();
        let total_cost = self.cost + shipping;

        Ok(PricingQuote {
            currency: self.currency,
            cost: cents(self.cost),
            shipping: cents(shipping),
            total_cost: cents(total_cost),
            price_a: cents(formulas::price_from_cost_margin(total_cost, self.tier_a_margin)),
            price_bcw: cents(formulas::price_from_cost_margin(total_cost, self.tier_bcw_margin)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cad_quote() {
        let quote = PricingRequest::new(100.0, Currency::Cad).quote().unwrap();
        assert_eq!(quote.shipping, 3.0);
        assert_eq!(quote.total_cost, 103.0);
        assert_eq!(quote.price_a, 147.14);
        assert_eq!(quote.price_bcw, 171.67);
    }

    #[test]
    fn test_usd_ships_at_four_percent() {
        let quote = PricingRequest::new(50.0, Currency::Usd).quote().unwrap();
        assert_eq!(quote.shipping, 2.0);
        assert_eq!(quote.total_cost, 52.0);
        assert_eq!(quote.price_a, 74.29);
    }

    #[test]
    fn test_rejects_non_positive_cost() {
        for cost in [0.0, -5.0, f64::NAN] {
            let err = PricingRequest::new(cost, Currency::Cad).quote().unwrap_err();
            assert!(matches!(err, AssistantError::Calculation(_)));
        }
    }

    #[test]
    fn test_request_defaults_from_json() {
        let request: PricingRequest = serde_json::from_str(r#"{"cost": 10}"#).unwrap();
        assert_eq!(request, PricingRequest::new(10.0, Currency::Cad));

        let request: PricingRequest =
            serde_json::from_str(r#"{"cost": 10, "currency": "USD", "tier_a_margin": 25}"#).unwrap();
        assert_eq!(request.currency, Currency::Usd);
        assert_eq!(request.tier_a_margin, 25.0);
        assert_eq!(request.tier_bcw_margin, 40.0);
    }
}

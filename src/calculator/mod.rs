//! Form calculators
//!
//! The two non-chat tools of the suite: a margin worksheet that fills in the
//! third of cost / margin / revenue, and a tiered pricing calculator with a
//! shipping allowance.

pub mod pricing;

pub use pricing::{PricingQuote, PricingRequest};

use crate::exchange::ExchangeState;
use crate::formulas;
use crate::models::Direction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Cost,
    Margin,
    Revenue,
}

/// Cost (CAD), margin % and revenue (CAD); any field may be blank
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MarginWorksheet {
    pub cost: Option<f64>,
    pub margin: Option<f64>,
    pub revenue: Option<f64>,
}

impl MarginWorksheet {
    /// Set `field` and derive the missing value from whichever other field is
    /// filled. Cost edits prefer margin over revenue, margin edits prefer
    /// cost, revenue edits prefer cost. Derived values are rounded to cents.
    pub fn edit(&mut self, field: Field, value: Option<f64>) {
        match field {
            Field::Cost => {
                self.cost = value;
                if self.margin.is_some() {
                    self.derive_revenue_from_cost();
                } else if self.revenue.is_some() {
                    self.derive_margin();
                }
            }
            Field::Margin => {
                self.margin = value;
                if self.cost.is_some() {
                    self.derive_revenue_from_cost();
                } else if self.revenue.is_some() {
                    self.derive_cost();
                }
            }
            Field::Revenue => {
                self.revenue = value;
                if self.cost.is_some() {
                    self.derive_margin();
                } else if self.margin.is_some() {
                    self.derive_cost();
                }
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Revenue converted with the session's CAD→USD rate
    pub fn revenue_usd(&self, rates: &ExchangeState) -> f64 {
        cents(rates.convert(self.revenue.unwrap_or(0.0), Direction::CadToUsd))
    }

    /// Profit (revenue − cost) when both are known
    pub fn profit(&self) -> Option<f64> {
        Some(cents(self.revenue? - self.cost?))
    }

    /// Markup implied by the margin, when the margin is below 100
    pub fn markup(&self) -> Option<f64> {
        let margin = self.margin?;
        (margin < 100.0).then(|| cents(formulas::markup_from_margin(margin)))
    }

    fn derive_revenue_from_cost(&mut self) {
        let cost = self.cost.unwrap_or(0.0);
        let margin = self.margin.unwrap_or(0.0);
        if cost > 0.0 && valid_margin(margin) {
            self.revenue = Some(cents(formulas::price_from_cost_margin(cost, margin)));
        }
    }

    fn derive_margin(&mut self) {
        let cost = self.cost.unwrap_or(0.0);
        let revenue = self.revenue.unwrap_or(0.0);
        if cost > 0.0 && revenue > cost {
            self.margin = Some(cents(formulas::margin(cost, revenue)));
        }
    }

    fn derive_cost(&mut self) {
        let revenue = self.revenue.unwrap_or(0.0);
        let margin = self.margin.unwrap_or(0.0);
        if revenue > 0.0 && valid_margin(margin) {
            self.cost = Some(cents(formulas::cost_from_price_margin(revenue, margin)));
        }
    }
}

fn valid_margin(margin: f64) -> bool {
    (0.0..100.0).contains(&margin)
}

pub(crate) fn cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

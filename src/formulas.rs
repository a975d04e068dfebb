//! Margin, markup, price and cost conversions
//!
//! Pure functions. Inputs are not validated: a margin of 100 yields an
//! infinite price, a zero price yields a NaN or infinite margin, and callers
//! render those values as they are.

/// Margin as a percentage of price
pub fn margin(cost: f64, price: f64) -> f64 {
    (price - cost) / price * 100.0
}

/// Selling price that yields `margin_pct` on `cost`
pub fn price_from_cost_margin(cost: f64, margin_pct: f64) -> f64 {
    cost / (1.0 - margin_pct / 100.0)
}

/// Cost that leaves `margin_pct` on `price`
pub fn cost_from_price_margin(price: f64, margin_pct: f64) -> f64 {
    price * (1.0 - margin_pct / 100.0)
}

pub fn markup_from_margin(margin_pct: f64) -> f64 {
    margin_pct / (100.0 - margin_pct) * 100.0
}

pub fn margin_from_markup(markup_pct: f64) -> f64 {
    markup_pct / (100.0 + markup_pct) * 100.0
}

//! Core data models shared by the interpreter, the calculators and the API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Cad,
    Usd,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    CadToUsd,
    UsdToCad,
}

//
// ================= Exchange =================
//

/// A quote obtained from the external rate source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RateQuote {
    pub usd_to_cad: f64,
    pub cad_to_usd: f64,
    pub fetched_at: DateTime<Utc>,
}

impl RateQuote {
    /// Build a quote from the USD→CAD side; the other side is its reciprocal.
    pub fn from_usd_to_cad(usd_to_cad: f64) -> Self {
        Self {
            usd_to_cad,
            cad_to_usd: 1.0 / usd_to_cad,
            fetched_at: Utc::now(),
        }
    }
}

/// Read-only view of an exchange state, as reported over the API
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ExchangeSnapshot {
    pub cad_to_usd: f64,
    pub usd_to_cad: f64,
    pub manual_override_rate: Option<f64>,
    pub effective_usd_to_cad: f64,
    pub effective_cad_to_usd: f64,
}

//
// ================= Interpretation =================
//

/// A successful interpretation of a free-text query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interpretation {
    pub text: String,
    /// Only the "set rate" intent mutates the exchange state
    #[serde(default)]
    pub state_changed: bool,
}

impl Interpretation {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            state_changed: false,
        }
    }

    pub fn state_change(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            state_changed: true,
        }
    }
}

/// What a chat caller shows the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatReply {
    pub answer: String,
    /// False when no intent fired and the fallback help was substituted
    pub matched: bool,
    pub state_changed: bool,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Currency::Cad => "CAD",
            Currency::Usd => "USD",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::CadToUsd => "CAD→USD",
            Direction::UsdToCad => "USD→CAD",
        };
        write!(f, "{}", s)
    }
}

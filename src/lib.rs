//! Margin Assistant
//!
//! A natural-language calculator for a margin chatbot:
//! - Interprets free-text finance questions through an ordered intent table
//! - Keeps per-chat USD/CAD exchange state with a manual override
//! - Refreshes market rates from an external source, falling back to fixed rates
//! - Serves the interpreter and the form calculators over HTTP
//!
//! QUERY FLOW:
//! TEXT → NUMBERS → FIRST MATCHING INTENT → FORMATTED ANSWER

pub mod api;
pub mod calculator;
pub mod chat;
pub mod config;
pub mod error;
pub mod exchange;
pub mod extractor;
pub mod format;
pub mod formulas;
pub mod intent;
pub mod models;
pub mod session;

pub use error::Result;

// Re-export common types
pub use exchange::ExchangeState;
pub use intent::interpret;
pub use models::*;

//! Chat front door
//!
//! Wraps the interpreter the way a chat widget uses it: blank input is
//! ignored, and a query no intent understands gets the generic help text.

use crate::exchange::ExchangeState;
use crate::intent::interpret;
use crate::models::ChatReply;
use tracing::info;

pub const WELCOME: &str = "👋 Hi! I'm your margin calculation assistant.\n\n\
I can help you with:\n\
• Margin, markup, pricing calculations\n\
• Currency conversions (USD ↔ CAD)\n\
• Percentage & math (30% of 130)\n\
• Profit, discount, tax, ROI\n\
• Tips, interest, averages\n\
• And much more!\n\n\
Just ask naturally or type \"help\" for examples! 😊";

pub const FALLBACK_HELP: &str = "I can help with many calculations! Try:\n\n\
**Percentages & Math:**\n\
• \"30% of 130\"\n\
• \"What is 25 + 75?\"\n\
• \"150 - 30\"\n\
• \"12 × 8\"\n\n\
**Margin & Pricing:**\n\
• \"Margin with cost 50 and price 100\"\n\
• \"Price for cost 60, margin 40%\"\n\
• \"Convert 50% markup to margin\"\n\n\
**Business:**\n\
• \"Profit from price 100, cost 60\"\n\
• \"20% discount on 150\"\n\
• \"15% tip on 50\"\n\
• \"ROI: gain 1200, cost 1000\"\n\n\
**Currency:**\n\
• \"100 USD to CAD\"\n\n\
Type 'help' for more examples!";

/// Answer one chat message. `None` for blank input.
pub fn reply(message: &str, state: &mut ExchangeState) -> Option<ChatReply> {
    if message.trim().is_empty() {
        return None;
    }

    let reply = match interpret(message, state) {
        Some(interpretation) => ChatReply {
            answer: interpretation.text,
            matched: true,
            state_changed: interpretation.state_changed,
        },
        None => {
            info!("query not understood, sending help");
            ChatReply {
                answer: FALLBACK_HELP.to_string(),
                matched: false,
                state_changed: false,
            }
        }
    };

    Some(reply)
}

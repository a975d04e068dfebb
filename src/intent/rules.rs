//! The intent table
//!
//! Order is load-bearing: earlier rows shadow later ones, and a row whose
//! keywords match without enough numbers lets the walk continue.

use super::{IntentRule, Query, RuleInput, RuleOutcome};
use crate::format;
use crate::formulas;
use crate::models::{Currency, Direction};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PERCENT_OF: Regex =
        Regex::new(r"[0-9]+%?\s*of\s*[0-9]+").expect("valid percent-of pattern");
    static ref PERCENT_LITERAL: Regex =
        Regex::new(r"([0-9]+)%").expect("valid percent pattern");
}

/// Margin assumed by the multi-cost rule when the query names none
const DEFAULT_MARGIN_PCT: f64 = 35.0;

const GREETINGS: &[&str] = &[
    "hi", "hello", "hey", "good morning", "good afternoon", "good evening",
];

const FAREWELLS: &[&str] = &["bye", "goodbye", "see you", "cya"];

const GREETING_REPLY: &str =
    "👋 Hey there! I'm your margin calculation assistant. How can I help you today?";

const WELLBEING_REPLY: &str =
    "I'm doing great, thanks for asking! 😊 Ready to help with calculations. What would you like to calculate?";

const THANKS_REPLY: &str = "You're welcome! 😊 Let me know if you need anything else!";

const FAREWELL_REPLY: &str = "Goodbye! 👋 Come back anytime you need help with calculations!";

const IDENTITY_REPLY: &str = "I'm your margin calculation assistant! 🤖 I can help you with:\n\
• Margin calculations\n\
• Markup conversions\n\
• Pricing formulas\n\
• Currency conversions\n\
• Percentage calculations\n\
• And much more!\n\n\
Just ask me anything!";

const HELP_REPLY: &str = "🆘 **Here's what I can do:**\n\n\
**Calculations:**\n\
• \"30% of 130\" - Percentage\n\
• \"Calculate margin with cost 50 and price 100\"\n\
• \"What price for cost 60 and margin 40%?\"\n\
• \"Convert 50% markup to margin\"\n\
• \"Cost 10, freight 2, duties 1, margin 40%\"\n\n\
**Currency:**\n\
• \"Convert 100 USD to CAD\"\n\
• \"Set rate 1.40\" - Override exchange rate\n\n\
**Math:**\n\
• \"What is 25 + 75?\"\n\
• \"150 - 30\"\n\
• \"12 × 8\" or \"12 * 8\"\n\
• \"100 / 4\"\n\n\
Just type your question naturally!";

macro_rules! rule {
    ($name:literal, $min:literal, $matches:expr, $compute:expr) => {
        IntentRule {
            name: $name,
            min_operands: $min,
            matches: $matches,
            compute: $compute,
        }
    };
}

/// Every intent, highest priority first
pub static RULES: &[IntentRule] = &[
    rule!("greeting", 0, is_greeting, |_| reply(GREETING_REPLY)),
    rule!("wellbeing", 0, asks_wellbeing, |_| reply(WELLBEING_REPLY)),
    rule!("thanks", 0, |q| q.has("thank"), |_| reply(THANKS_REPLY)),
    rule!("farewell", 0, |q| q.is_one_of(FAREWELLS), |_| reply(FAREWELL_REPLY)),
    rule!("identity", 0, asks_identity, |_| reply(IDENTITY_REPLY)),
    rule!("help", 0, asks_help, |_| reply(HELP_REPLY)),
    rule!("percent_of", 2, is_percent_of, percent_of),
    rule!("percent_change", 2, is_percent_change, percent_change),
    rule!("percentage_share", 2, is_percentage_share, percentage_share),
    rule!("addition", 2, |q| q.has_any(&["+", "plus", "add"]), addition),
    rule!("subtraction", 2, |q| q.has_any(&["-", "minus", "subtract"]), subtraction),
    rule!("multiplication", 2, |q| q.has_any(&["×", "*", "multiply", "times"]), multiplication),
    rule!("division", 2, |q| q.has_any(&["/", "÷", "divide", "divided"]), division),
    rule!("profit", 2, |q| q.has("profit"), profit),
    rule!("discount", 2, |q| q.has("discount"), discount),
    rule!("tax", 2, |q| q.has("tax"), with_surcharge),
    rule!("break_even", 2, |q| q.has_any(&["break even", "breakeven"]), break_even),
    rule!("roi", 2, |q| q.has_any(&["roi", "return on investment"]), roi),
    rule!("tip", 2, |q| q.has("tip"), with_surcharge),
    rule!("simple_interest", 3, |q| q.has("interest"), simple_interest),
    rule!("average", 2, |q| q.has_any(&["average", "mean"]), average),
    rule!("set_rate", 1, |q| q.has("set rate"), |input| RuleOutcome::OverrideRate(input.numbers[0])),
    rule!("cad_to_usd", 1, is_cad_to_usd, |input| convert(input, Direction::CadToUsd)),
    rule!("usd_to_cad", 1, is_usd_to_cad, |input| convert(input, Direction::UsdToCad)),
    rule!("price_for_margin", 2, is_price_for_margin, price_for_margin),
    rule!("margin_from_cost_price", 2, is_margin_from_cost_price, margin_from_cost_price),
    rule!("cost_from_price_margin", 2, is_cost_from_price_margin, cost_from_price_margin),
    rule!("markup_to_margin", 1, is_markup_to_margin, |input| {
        reply(format::percent(formulas::margin_from_markup(input.numbers[0])))
    }),
    rule!("margin_to_markup", 1, is_margin_to_markup, |input| {
        reply(format::percent(formulas::markup_from_margin(input.numbers[0])))
    }),
    rule!("multi_cost_price", 2, is_multi_cost, multi_cost_price),
    rule!("price_from_cost_margin", 2, is_price_from_cost_margin, |input| {
        let n = input.numbers;
        reply(format::money(formulas::price_from_cost_margin(n[0], n[1])))
    }),
];

fn reply(text: impl Into<String>) -> RuleOutcome {
    RuleOutcome::Reply(text.into())
}

//
// ================= Predicates =================
//

fn is_greeting(q: &Query) -> bool {
    q.is_one_of(GREETINGS)
}

fn asks_wellbeing(q: &Query) -> bool {
    q.has_any(&["how are you", "how r u"])
}

fn asks_identity(q: &Query) -> bool {
    q.has_any(&["who are you", "what are you"])
}

fn asks_help(q: &Query) -> bool {
    q.has("help") || q.lower() == "?"
}

fn is_percent_of(q: &Query) -> bool {
    q.has_all(&["%", "of"]) || PERCENT_OF.is_match(q.lower())
}

fn is_percent_change(q: &Query) -> bool {
    q.has_any(&["increase", "decrease"]) && q.has("%")
}

fn is_percentage_share(q: &Query) -> bool {
    // "what's" is covered by "what"
    q.has("what") && q.has_all(&["percentage", "of"])
}

fn is_cad_to_usd(q: &Query) -> bool {
    (q.has_all(&["convert", "cad"]) && !q.has("to cad")) || q.has("to usd")
}

fn is_usd_to_cad(q: &Query) -> bool {
    q.has_all(&["convert", "usd"]) || q.has("to cad")
}

/// A margin operand is present (a "%") and price is the unknown.
fn is_price_for_margin(q: &Query) -> bool {
    let names_price = q.has_any(&["price", "selling", "what"]);
    q.has("%")
        && ((q.has_all(&["cost", "margin"]) && names_price) || q.has_all(&["if cost", "margin"]))
}

fn is_margin_from_cost_price(q: &Query) -> bool {
    (q.has_all(&["margin", "cost"]) && q.has_any(&["price", "revenue", "selling"]))
        || q.has_all(&["what", "margin"])
}

fn is_cost_from_price_margin(q: &Query) -> bool {
    q.has("cost") && q.has_any(&["price", "revenue"]) && q.has("margin")
}

fn is_markup_to_margin(q: &Query) -> bool {
    q.has_all(&["markup", "margin"]) || q.has("markup to margin")
}

fn is_margin_to_markup(q: &Query) -> bool {
    q.has_all(&["margin", "markup"]) || q.has("margin to markup")
}

fn is_multi_cost(q: &Query) -> bool {
    q.has_any(&["freight", "duties", "overhead", "multiple cost"]) && q.has_any(&["margin", "price"])
}

fn is_price_from_cost_margin(q: &Query) -> bool {
    q.has_any(&["price", "selling"]) && q.has_all(&["cost", "margin"])
}

//
// ================= Computations =================
//

fn percent_of(input: &RuleInput) -> RuleOutcome {
    let (percent, amount) = (input.numbers[0], input.numbers[1]);
    reply(format::number(percent / 100.0 * amount))
}

fn percent_change(input: &RuleInput) -> RuleOutcome {
    let (amount, percent) = (input.numbers[0], input.numbers[1]);
    let change = amount * percent / 100.0;
    let result = if input.query.has("increase") {
        amount + change
    } else {
        amount - change
    };
    reply(format::number(result))
}

fn percentage_share(input: &RuleInput) -> RuleOutcome {
    let (part, whole) = (input.numbers[0], input.numbers[1]);
    reply(format::percent(part / whole * 100.0))
}

fn addition(input: &RuleInput) -> RuleOutcome {
    reply(format::number(input.numbers.iter().sum()))
}

fn subtraction(input: &RuleInput) -> RuleOutcome {
    let (first, rest) = (input.numbers[0], &input.numbers[1..]);
    reply(format::number(rest.iter().fold(first, |acc, n| acc - n)))
}

fn multiplication(input: &RuleInput) -> RuleOutcome {
    reply(format::number(input.numbers.iter().product()))
}

fn division(input: &RuleInput) -> RuleOutcome {
    let (first, rest) = (input.numbers[0], &input.numbers[1..]);
    reply(format::number(rest.iter().fold(first, |acc, n| acc / n)))
}

fn profit(input: &RuleInput) -> RuleOutcome {
    let (price, cost) = (input.numbers[0], input.numbers[1]);
    reply(format::money(price - cost))
}

fn discount(input: &RuleInput) -> RuleOutcome {
    let (price, discount_pct) = (input.numbers[0], input.numbers[1]);
    reply(format::money(price - price * discount_pct / 100.0))
}

/// Tax and tip: amount plus a percentage of itself
fn with_surcharge(input: &RuleInput) -> RuleOutcome {
    let (amount, rate_pct) = (input.numbers[0], input.numbers[1]);
    reply(format::money(amount + amount * rate_pct / 100.0))
}

/// Two numbers read as (fixed costs = unit price, unit cost);
/// three or more as (fixed costs, unit price, unit cost).
fn break_even(input: &RuleInput) -> RuleOutcome {
    let n = input.numbers;
    let fixed_costs = n[0];
    let (unit_price, unit_cost) = if n.len() >= 3 { (n[1], n[2]) } else { (n[0], n[1]) };
    reply(format::units((fixed_costs / (unit_price - unit_cost)).ceil()))
}

fn roi(input: &RuleInput) -> RuleOutcome {
    let (gain, cost) = (input.numbers[0], input.numbers[1]);
    reply(format::percent((gain - cost) / cost * 100.0))
}

fn simple_interest(input: &RuleInput) -> RuleOutcome {
    let (principal, rate_pct, years) = (input.numbers[0], input.numbers[1], input.numbers[2]);
    reply(format::money(principal + principal * rate_pct * years / 100.0))
}

fn average(input: &RuleInput) -> RuleOutcome {
    let n = input.numbers;
    reply(format::number(n.iter().sum::<f64>() / n.len() as f64))
}

fn convert(input: &RuleInput, direction: Direction) -> RuleOutcome {
    let target = match direction {
        Direction::CadToUsd => Currency::Usd,
        Direction::UsdToCad => Currency::Cad,
    };
    reply(format::money_in(input.rates.convert(input.numbers[0], direction), target))
}

/// Price for a cost and margin, possibly with a USD cost priced in CAD.
fn price_for_margin(input: &RuleInput) -> RuleOutcome {
    let q = input.query;
    let (mut cost, mut margin) = (input.numbers[0], input.numbers[1]);

    // "margin 40% on cost 60": operands arrive margin-first
    if let (Some(margin_at), Some(cost_at)) = (q.position("margin"), q.position("cost")) {
        if margin_at > 0 && margin_at < cost_at {
            std::mem::swap(&mut cost, &mut margin);
        }
    }

    let mut price = formulas::price_from_cost_margin(cost, margin);
    let mut explanation = String::new();

    let label = if q.has_all(&["usd", "cad"]) {
        if q.has("cost") && !q.has("price") {
            let rate = input.rates.rate(Direction::UsdToCad);
            let cad_cost = cost * rate;
            price = formulas::price_from_cost_margin(cad_cost, margin);
            explanation = format!(
                "\n\n💱 **Currency Conversion:**\nCost: {} USD × {} = ${} CAD\nThen applied {}% margin",
                format::operand(cost),
                format::fixed(rate, 4),
                format::fixed(cad_cost, 2),
                format::operand(margin),
            );
        }
        Some(Currency::Cad)
    } else if q.has("usd") {
        Some(Currency::Usd)
    } else if q.has("cad") {
        Some(Currency::Cad)
    } else {
        None
    };

    let amount = match label {
        Some(currency) => format::money_in(price, currency),
        None => format::money(price),
    };
    reply(amount + &explanation)
}

fn margin_from_cost_price(input: &RuleInput) -> RuleOutcome {
    let (cost, price) = (input.numbers[0], input.numbers[1]);
    reply(format::percent(formulas::margin(cost, price)))
}

fn cost_from_price_margin(input: &RuleInput) -> RuleOutcome {
    let (price, margin) = (input.numbers[0], input.numbers[1]);
    reply(format::money(formulas::cost_from_price_margin(price, margin)))
}

/// Every number counts toward total cost, the margin included.
fn multi_cost_price(input: &RuleInput) -> RuleOutcome {
    let q = input.query;
    let total_cost: f64 = input.numbers.iter().sum();

    let stated_margin = if q.has("margin") {
        PERCENT_LITERAL
            .captures(q.lower())
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    } else {
        None
    };

    let margin = stated_margin
        .or_else(|| input.numbers.last().copied())
        .unwrap_or(DEFAULT_MARGIN_PCT);

    reply(format::money(formulas::price_from_cost_margin(total_cost, margin)))
}

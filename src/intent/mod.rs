//! Natural-language query interpreter
//!
//! Walks an ordered table of intent rules against a lowercased query and the
//! numbers found in it. A rule fires when its keyword predicate holds AND
//! enough operands were extracted; a rule whose keywords match but lacks
//! operands is skipped and the walk continues. The first rule to fire wins.

pub mod rules;

pub use rules::RULES;

use crate::exchange::ExchangeState;
use crate::extractor::extract_numbers;
use crate::format;
use crate::models::Interpretation;
use tracing::debug;

/// A query, kept both as typed and lowercased for keyword tests
#[derive(Debug, Clone)]
pub struct Query<'a> {
    raw: &'a str,
    lower: String,
}

impl<'a> Query<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            lower: raw.to_lowercase(),
        }
    }

    pub fn raw(&self) -> &str {
        self.raw
    }

    pub fn lower(&self) -> &str {
        &self.lower
    }

    pub fn has(&self, needle: &str) -> bool {
        self.lower.contains(needle)
    }

    pub fn has_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.lower.contains(n))
    }

    pub fn has_all(&self, needles: &[&str]) -> bool {
        needles.iter().all(|n| self.lower.contains(n))
    }

    /// The whole lowercased query equals one of `words`
    pub fn is_one_of(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.lower == *w)
    }

    pub fn position(&self, needle: &str) -> Option<usize> {
        self.lower.find(needle)
    }
}

/// What a rule produced
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    Reply(String),
    /// Install a USD→CAD override; the dispatcher applies it and confirms
    OverrideRate(f64),
}

/// Inputs a rule computes from
pub struct RuleInput<'q, 'n, 's> {
    pub query: &'q Query<'q>,
    pub numbers: &'n [f64],
    pub rates: &'s ExchangeState,
}

/// One row of the intent table
pub struct IntentRule {
    pub name: &'static str,
    pub min_operands: usize,
    pub matches: fn(&Query) -> bool,
    pub compute: fn(&RuleInput) -> RuleOutcome,
}

/// Interpret `query` against the default rule table.
///
/// `None` means no rule fired; the caller substitutes its own help text.
pub fn interpret(query: &str, state: &mut ExchangeState) -> Option<Interpretation> {
    interpret_with(RULES, query, state)
}

/// Interpret `query` against an explicit, ordered rule table.
pub fn interpret_with(
    rules: &[IntentRule],
    query: &str,
    state: &mut ExchangeState,
) -> Option<Interpretation> {
    let query = Query::new(query);
    let numbers = extract_numbers(query.raw());

    for rule in rules {
        if !(rule.matches)(&query) {
            continue;
        }
        if numbers.len() < rule.min_operands {
            debug!(
                rule = rule.name,
                needed = rule.min_operands,
                found = numbers.len(),
                "keywords matched but too few operands, falling through"
            );
            continue;
        }

        debug!(rule = rule.name, operands = numbers.len(), "intent matched");

        let outcome = (rule.compute)(&RuleInput {
            query: &query,
            numbers: &numbers,
            rates: state,
        });

        return Some(match outcome {
            RuleOutcome::Reply(text) => Interpretation::text(text),
            RuleOutcome::OverrideRate(rate) => {
                state.set_manual_rate(rate);
                Interpretation::state_change(format::rate_updated(rate))
            }
        });
    }

    debug!(operands = numbers.len(), "no intent matched");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(query: &str) -> Option<String> {
        let mut state = ExchangeState::new();
        interpret(query, &mut state).map(|i| i.text)
    }

    fn answer(query: &str) -> String {
        ask(query).unwrap_or_else(|| panic!("no intent matched {query:?}"))
    }

    #[test]
    fn test_documented_scenarios() {
        let mut state = ExchangeState::new();

        assert_eq!(interpret("30% of 130", &mut state).unwrap().text, "**39.00**");
        assert_eq!(
            interpret("margin with cost 50 and price 100", &mut state).unwrap().text,
            "**50.00%**"
        );
        assert_eq!(
            interpret("price for cost 60 and margin 40%", &mut state).unwrap().text,
            "**$100.00**"
        );

        let set = interpret("set rate 1.40", &mut state).unwrap();
        assert!(set.state_changed);
        assert!(set.text.contains("1.4000"));
        assert!(set.text.contains("0.7143"));
        assert_eq!(state.manual_override_rate(), Some(1.4));

        let converted = interpret("convert 100 usd to cad", &mut state).unwrap();
        assert_eq!(converted.text, "**$140.00 CAD**");
        assert!(!converted.state_changed);
    }

    #[test]
    fn test_greeting_ignores_state() {
        let mut fresh = ExchangeState::new();
        let mut overridden = ExchangeState::new();
        overridden.set_manual_rate(2.0);

        let a = interpret("hello", &mut fresh).unwrap();
        let b = interpret("hello", &mut overridden).unwrap();
        assert_eq!(a, b);
        assert!(a.text.contains("Hey there"));
    }

    #[test]
    fn test_fallthrough_on_missing_operands() {
        // keywords of the margin, cost-from-price and price-from-cost rules, one number
        assert_eq!(ask("what margin for selling price with cost 40"), None);
        assert_eq!(ask("price cost margin 40%"), None);
        assert_eq!(ask("add 5"), None);
    }

    #[test]
    fn test_fallthrough_reaches_later_rule() {
        // "interest" needs three numbers
        assert_eq!(ask("interest on 1000 at 5"), None);
        assert_eq!(ask("set rate"), None);
        // percent-of and increase both match, both need two numbers
        assert_eq!(ask("increase of 50%"), None);
        // "add" needs two numbers, markup-to-margin needs one
        assert_eq!(answer("add markup 50 to margin"), "**33.33%**");
    }

    #[test]
    fn test_first_match_wins() {
        // arithmetic "+" precedes the freight rule
        assert_eq!(answer("cost 10 + freight 2 + duties 1, margin 40%"), "**53.00**");
        // "profit" contains "of", so a "%" sends it to the percentage rule
        assert_eq!(answer("profit 20% on 50"), "**10.00**");
    }

    #[test]
    fn test_no_match() {
        assert_eq!(ask("what's the weather like"), None);
        assert_eq!(ask("42"), None);
        assert_eq!(ask(""), None);
    }

    #[test]
    fn test_custom_table_order() {
        fn always(_: &Query) -> bool {
            true
        }
        fn first(_: &RuleInput) -> RuleOutcome {
            RuleOutcome::Reply("first".into())
        }
        fn second(_: &RuleInput) -> RuleOutcome {
            RuleOutcome::Reply("second".into())
        }

        let table = [
            IntentRule { name: "needs_two", min_operands: 2, matches: always, compute: first },
            IntentRule { name: "needs_none", min_operands: 0, matches: always, compute: second },
        ];

        let mut state = ExchangeState::new();
        assert_eq!(interpret_with(&table, "1", &mut state).unwrap().text, "second");
        assert_eq!(interpret_with(&table, "1 2", &mut state).unwrap().text, "first");
        assert!(interpret_with(&[], "1 2", &mut state).is_none());
    }
}

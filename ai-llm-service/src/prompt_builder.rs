//! Bounded, deterministic prompt construction.
//!
//! The query is capped at a character budget (Unicode scalar values, not
//! bytes) and the optional portfolio is embedded as an opaque JSON block.
//! Building is pure apart from a warning event on truncation.

use std::ops::Range;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Appended to a query that was cut at the budget.
pub const TRUNCATION_MARKER: &str = " …[truncated]";

const PREAMBLE: &str = "You are Vittcott, an AI investing assistant. \
Answer the user's finance question clearly and factually. \
Use the portfolio only as context for the answer. \
Remind the user that this is educational information, not financial advice.";

const NO_PORTFOLIO: &str = "(none provided)";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("query must not be empty")]
    EmptyQuery,
}

/// Immutable prompt text plus a few facts about how it was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    text: String,
    query: Range<usize>,
    truncated: bool,
}

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The (possibly truncated) query as embedded in the prompt.
    pub fn query_segment(&self) -> &str {
        &self.text[self.query.clone()]
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    max_query_chars: usize,
}

impl PromptBuilder {
    pub fn new(max_query_chars: usize) -> Self {
        Self {
            max_query_chars: max_query_chars.max(1),
        }
    }

    pub fn max_query_chars(&self) -> usize {
        self.max_query_chars
    }

    /// Builds the prompt for `query` with optional portfolio context.
    ///
    /// # Errors
    /// [`PromptError::EmptyQuery`] when the query is empty or whitespace only.
    pub fn build(&self, query: &str, portfolio: Option<&Value>) -> Result<Prompt, PromptError> {
        if query.trim().is_empty() {
            return Err(PromptError::EmptyQuery);
        }

        let (query_text, truncated) = self.bound_query(query);

        let mut text = String::with_capacity(PREAMBLE.len() + query_text.len() + 64);
        text.push_str(PREAMBLE);
        text.push_str("\n\nUser question:\n");
        let start = text.len();
        text.push_str(&query_text);
        let end = text.len();
        text.push_str("\n\nPortfolio:\n");
        text.push_str(&render_portfolio(portfolio));

        Ok(Prompt {
            text,
            query: start..end,
            truncated,
        })
    }

    fn bound_query(&self, query: &str) -> (String, bool) {
        let total = query.chars().count();
        if total <= self.max_query_chars {
            return (query.to_string(), false);
        }

        warn!(
            original_chars = total,
            max_chars = self.max_query_chars,
            "query truncated to character budget"
        );

        let mut bounded: String = query.chars().take(self.max_query_chars).collect();
        bounded.push_str(TRUNCATION_MARKER);
        (bounded, true)
    }
}

fn render_portfolio(portfolio: Option<&Value>) -> String {
    match portfolio {
        None | Some(Value::Null) => NO_PORTFOLIO.to_string(),
        Some(Value::Object(map)) if map.is_empty() => NO_PORTFOLIO.to_string(),
        Some(Value::Array(items)) if items.is_empty() => NO_PORTFOLIO.to_string(),
        Some(value) => serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;
    use tracing::{
        Event, Level, Subscriber,
        field::{Field, Visit},
    };
    use tracing_subscriber::{
        layer::{Context, Layer, SubscriberExt},
        registry,
    };

    use super::*;

    /// Collects the fields of every WARN event.
    #[derive(Clone, Default)]
    struct WarnEvents(Arc<Mutex<Vec<Vec<(String, String)>>>>);

    struct FieldCollector(Vec<(String, String)>);

    impl Visit for FieldCollector {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            self.0.push((field.name().to_string(), format!("{value:?}")));
        }
    }

    impl<S: Subscriber> Layer<S> for WarnEvents {
        fn on_event(&self, event: &Event<'_>, _: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                let mut fields = FieldCollector(Vec::new());
                event.record(&mut fields);
                self.0.lock().unwrap().push(fields.0);
            }
        }
    }

    fn warnings_while(f: impl FnOnce()) -> Vec<Vec<(String, String)>> {
        let events = WarnEvents::default();
        let subscriber = registry().with(events.clone());
        tracing::subscriber::with_default(subscriber, f);
        let captured = events.0.lock().unwrap().clone();
        captured
    }

    fn field<'a>(event: &'a [(String, String)], name: &str) -> Option<&'a str> {
        event
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn rejects_blank_queries() {
        let builder = PromptBuilder::new(2000);
        assert_eq!(builder.build("", None), Err(PromptError::EmptyQuery));
        assert_eq!(builder.build(" \n\t ", None), Err(PromptError::EmptyQuery));
    }

    #[test]
    fn short_query_is_verbatim_and_deterministic() {
        let builder = PromptBuilder::new(2000);
        let portfolio = json!({ "stocks": [{ "name": "TCS", "quantity": 5 }], "cash": 1000 });

        let a = builder.build("  Should I rebalance?  ", Some(&portfolio)).unwrap();
        let b = builder.build("  Should I rebalance?  ", Some(&portfolio)).unwrap();

        assert_eq!(a, b);
        assert!(!a.truncated());
        assert_eq!(a.query_segment(), "  Should I rebalance?  ");
        assert!(a.as_str().contains("  Should I rebalance?  "));
        assert!(a.as_str().contains("\"TCS\""));
    }

    #[test]
    fn query_at_budget_is_not_truncated() {
        let builder = PromptBuilder::new(10);
        let prompt = builder.build("0123456789", None).unwrap();
        assert!(!prompt.truncated());
        assert_eq!(prompt.query_segment(), "0123456789");
    }

    #[test]
    fn long_query_is_cut_to_budget_plus_marker() {
        let builder = PromptBuilder::new(2000);
        let query = "a".repeat(5000);

        let prompt = builder.build(&query, None).unwrap();

        assert!(prompt.truncated());
        assert_eq!(
            prompt.query_segment().chars().count(),
            2000 + TRUNCATION_MARKER.chars().count()
        );
        assert!(prompt.query_segment().ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn truncation_emits_one_warning() {
        let builder = PromptBuilder::new(10);

        let warnings = warnings_while(|| {
            builder.build(&"x".repeat(25), None).unwrap();
        });
        assert_eq!(warnings.len(), 1);
        assert_eq!(field(&warnings[0], "original_chars"), Some("25"));
        assert_eq!(field(&warnings[0], "max_chars"), Some("10"));

        let warnings = warnings_while(|| {
            builder.build("0123456789", None).unwrap();
        });
        assert!(warnings.is_empty());
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let builder = PromptBuilder::new(3);
        let prompt = builder.build("₹₹₹₹₹", None).unwrap();
        assert_eq!(prompt.query_segment(), format!("₹₹₹{TRUNCATION_MARKER}"));
    }

    #[test]
    fn missing_or_empty_portfolio_is_labelled() {
        let builder = PromptBuilder::new(100);
        for portfolio in [None, Some(json!(null)), Some(json!({})), Some(json!([]))] {
            let prompt = builder.build("hi", portfolio.as_ref()).unwrap();
            assert!(prompt.as_str().ends_with("Portfolio:\n(none provided)"));
        }
    }

    #[test]
    fn nested_portfolio_passes_through_untouched() {
        let builder = PromptBuilder::new(100);
        let portfolio = json!({ "a": { "b": { "c": [1, 2, { "d": "e" }] } } });
        let prompt = builder.build("hi", Some(&portfolio)).unwrap();

        let block = prompt.as_str().split("Portfolio:\n").nth(1).unwrap();
        let parsed: Value = serde_json::from_str(block).unwrap();
        assert_eq!(parsed, portfolio);
    }
}

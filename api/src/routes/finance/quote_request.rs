use market_quotes::service::DEFAULT_RANGE;
use serde::Deserialize;

/// Query string of /api/finance/quote.
#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub symbol: String,
    #[serde(default = "default_range")]
    pub range: String,
}

fn default_range() -> String {
    DEFAULT_RANGE.to_string()
}

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuoteError>;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("symbol must not be empty")]
    InvalidSymbol,

    #[error("invalid value for {var}: {reason}")]
    Config { var: &'static str, reason: String },

    #[error("invalid upstream url: {0}")]
    Url(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {source_name}: {snippet}")]
    HttpStatus {
        source_name: &'static str,
        status: StatusCode,
        snippet: String,
    },

    #[error("failed to decode {source_name} response: {reason}")]
    Decode {
        source_name: &'static str,
        reason: String,
    },

    #[error("no market data for {symbol}")]
    NoData { symbol: String },
}

/// Trims a response body to something safe to log.
pub(crate) fn snippet(text: &str) -> String {
    const MAX: usize = 200;
    let trimmed = text.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

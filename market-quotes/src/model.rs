use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// RFC3339 timestamp of the bar open.
    pub ts: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Quote payload returned by `GET /api/finance/quote`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub symbol: String,
    pub range: String,
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    pub candles: Vec<Candle>,
    /// Untouched upstream body, only for the primary source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

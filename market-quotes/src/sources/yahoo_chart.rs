use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    config::QuoteSettings,
    errors::{QuoteError, Result, snippet},
    model::{Candle, Quote},
    sources::QuoteSource,
};

const NAME: &str = "yahoo";
/// Yahoo rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; vittcott-backend/0.1)";

/// Yahoo chart API: one month of daily candles, price is the last close.
pub struct YahooChartClient {
    client: reqwest::Client,
    base: String,
}

impl YahooChartClient {
    pub fn new(settings: &QuoteSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base: settings.yahoo_base.clone(),
        })
    }

    fn chart_url(&self, symbol: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base).map_err(|e| QuoteError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| QuoteError::Url(self.base.clone()))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }
}

#[async_trait]
impl QuoteSource for YahooChartClient {
    fn name(&self) -> &'static str {
        NAME
    }

    #[instrument(name = "yahoo_fetch", skip(self))]
    async fn fetch(&self, symbol: &str, range: &str) -> Result<Quote> {
        let url = self.chart_url(symbol)?;
        let resp = self
            .client
            .get(url)
            .query(&[("range", "1mo"), ("interval", "1d")])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(QuoteError::HttpStatus {
                source_name: NAME,
                status,
                snippet: snippet(&body),
            });
        }

        let candles = parse_chart(symbol, &body)?;
        debug!(candles = candles.len(), "yahoo answered");

        Ok(Quote {
            symbol: symbol.to_string(),
            range: range.to_string(),
            price: candles.last().map(|c| c.close),
            change: None,
            candles,
            raw: None,
        })
    }
}

#[derive(Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<OhlcvSeries>,
}

#[derive(Deserialize, Default)]
struct OhlcvSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Turns a chart body into candles, skipping bars with missing values.
fn parse_chart(symbol: &str, body: &str) -> Result<Vec<Candle>> {
    let envelope: ChartEnvelope = serde_json::from_str(body).map_err(|e| QuoteError::Decode {
        source_name: NAME,
        reason: e.to_string(),
    })?;

    if let Some(err) = envelope.chart.error {
        debug!(reason = ?err.description, "yahoo reported an error");
        return Err(QuoteError::NoData {
            symbol: symbol.to_string(),
        });
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(QuoteError::NoData {
            symbol: symbol.to_string(),
        });
    };

    let series = result.indicators.quote.into_iter().next().unwrap_or_default();
    let at = |v: &Vec<Option<f64>>, i: usize| v.get(i).copied().flatten();

    let candles = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &secs)| {
            Some(Candle {
                ts: DateTime::from_timestamp(secs, 0)?.to_rfc3339_opts(SecondsFormat::Secs, true),
                open: at(&series.open, i)?,
                high: at(&series.high, i)?,
                low: at(&series.low, i)?,
                close: at(&series.close, i)?,
                volume: series.volume.get(i).copied().flatten().unwrap_or(0),
            })
        })
        .collect();

    Ok(candles)
}

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    config::QuoteSettings,
    errors::{QuoteError, Result, snippet},
    model::{Candle, Quote},
    sources::QuoteSource,
};

const NAME: &str = "financehub";

/// `GET {base}/market/quotes?symbol=..&range=..` with bearer auth.
pub struct FinanceHubClient {
    client: reqwest::Client,
    base: String,
    api_key: String,
}

impl FinanceHubClient {
    pub fn new(settings: &QuoteSettings, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            client,
            base: settings.financehub_base.clone(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl QuoteSource for FinanceHubClient {
    fn name(&self) -> &'static str {
        NAME
    }

    #[instrument(name = "financehub_fetch", skip(self))]
    async fn fetch(&self, symbol: &str, range: &str) -> Result<Quote> {
        let url = format!("{}/market/quotes", self.base);
        let resp = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("range", range)])
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(QuoteError::HttpStatus {
                source_name: NAME,
                status,
                snippet: snippet(&body),
            });
        }

        let body: Value = resp.json().await?;
        debug!("financehub answered");
        quote_from_body(symbol, range, body)
    }
}

/// Maps the FinanceHub body. `candles` entries that do not parse are dropped.
fn quote_from_body(symbol: &str, range: &str, body: Value) -> Result<Quote> {
    if !body.is_object() {
        return Err(QuoteError::Decode {
            source_name: NAME,
            reason: "expected a JSON object".into(),
        });
    }

    let candles = body
        .get("candles")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|c| serde_json::from_value::<Candle>(c.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    Ok(Quote {
        symbol: symbol.to_string(),
        range: range.to_string(),
        price: body.get("price").and_then(Value::as_f64),
        change: body.get("change").and_then(Value::as_f64),
        candles,
        raw: Some(body),
    })
}

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::{
    config::QuoteSettings,
    errors::{QuoteError, Result},
    model::Quote,
    sources::{QuoteSource, finance_hub::FinanceHubClient, yahoo_chart::YahooChartClient},
};

pub const DEFAULT_RANGE: &str = "1d";

/// Primary source when configured, fallback on any primary failure.
pub struct QuoteService {
    primary: Option<Arc<dyn QuoteSource>>,
    fallback: Arc<dyn QuoteSource>,
}

impl QuoteService {
    pub fn new(primary: Option<Arc<dyn QuoteSource>>, fallback: Arc<dyn QuoteSource>) -> Self {
        Self { primary, fallback }
    }

    /// FinanceHub (only with an API key) backed by the Yahoo chart API.
    pub fn from_settings(settings: &QuoteSettings) -> Result<Self> {
        let primary = match &settings.financehub_api_key {
            Some(key) => Some(Arc::new(FinanceHubClient::new(settings, key)?) as Arc<dyn QuoteSource>),
            None => {
                info!("FINANCEHUB_API_KEY not set, quotes served by fallback only");
                None
            }
        };
        Ok(Self::new(primary, Arc::new(YahooChartClient::new(settings)?)))
    }

    /// Fetches a quote for `symbol`; a blank `range` means [`DEFAULT_RANGE`].
    ///
    /// # Errors
    /// [`QuoteError::InvalidSymbol`] for a blank symbol, otherwise the
    /// fallback's error when both sources fail.
    #[instrument(skip(self))]
    pub async fn get_quote(&self, symbol: &str, range: &str) -> Result<Quote> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(QuoteError::InvalidSymbol);
        }
        let range = match range.trim() {
            "" => DEFAULT_RANGE,
            r => r,
        };

        if let Some(primary) = &self.primary {
            match primary.fetch(symbol, range).await {
                Ok(quote) => return Ok(quote),
                Err(err) => warn!(
                    source = primary.name(),
                    fallback = self.fallback.name(),
                    error = %err,
                    "primary quote source failed, falling back"
                ),
            }
        }

        self.fallback.fetch(symbol, range).await
    }
}

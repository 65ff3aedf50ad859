//! Upstream quote providers.

use async_trait::async_trait;

use crate::{errors::Result, model::Quote};

pub mod finance_hub;
pub mod yahoo_chart;

/// A market data provider that can answer one quote request.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Short provider name for logs and errors.
    fn name(&self) -> &'static str;

    async fn fetch(&self, symbol: &str, range: &str) -> Result<Quote>;
}

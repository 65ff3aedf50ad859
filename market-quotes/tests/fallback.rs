use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use market_quotes::{Quote, QuoteError, QuoteService, QuoteSource, errors::Result};

struct Fixed {
    name: &'static str,
    price: Option<f64>,
    calls: AtomicUsize,
}

impl Fixed {
    fn ok(name: &'static str, price: f64) -> Arc<Self> {
        Arc::new(Self {
            name,
            price: Some(price),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            price: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl QuoteSource for Fixed {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, symbol: &str, range: &str) -> Result<Quote> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.price {
            Some(price) => Ok(Quote {
                symbol: symbol.into(),
                range: range.into(),
                price: Some(price),
                change: None,
                candles: Vec::new(),
                raw: None,
            }),
            None => Err(QuoteError::NoData {
                symbol: symbol.into(),
            }),
        }
    }
}

#[tokio::test]
async fn primary_answer_wins() {
    let primary = Fixed::ok("primary", 1.0);
    let fallback = Fixed::ok("fallback", 2.0);
    let service = QuoteService::new(
        Some(primary.clone() as Arc<dyn QuoteSource>),
        fallback.clone(),
    );

    let quote = service.get_quote("AAPL", "5d").await.unwrap();
    assert_eq!(quote.price, Some(1.0));
    assert_eq!(quote.range, "5d");
    assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn primary_failure_falls_back() {
    let primary = Fixed::failing("primary");
    let fallback = Fixed::ok("fallback", 2.0);
    let service = QuoteService::new(
        Some(primary.clone() as Arc<dyn QuoteSource>),
        fallback.clone(),
    );

    let quote = service.get_quote("AAPL", "1d").await.unwrap();
    assert_eq!(quote.price, Some(2.0));
    assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn without_primary_only_fallback_is_used() {
    let fallback = Fixed::ok("fallback", 3.0);
    let service = QuoteService::new(None, fallback.clone());

    let quote = service.get_quote(" MSFT ", "").await.unwrap();
    assert_eq!(quote.symbol, "MSFT");
    assert_eq!(quote.range, "1d");
}

#[tokio::test]
async fn both_failing_surfaces_fallback_error() {
    let service = QuoteService::new(
        Some(Fixed::failing("primary") as Arc<dyn QuoteSource>),
        Fixed::failing("fallback"),
    );
    let err = service.get_quote("ZZZZ", "1d").await.unwrap_err();
    assert!(matches!(err, QuoteError::NoData { .. }));
}

#[tokio::test]
async fn blank_symbol_is_rejected_before_any_call() {
    let fallback = Fixed::ok("fallback", 1.0);
    let service = QuoteService::new(None, fallback.clone());
    assert!(matches!(
        service.get_quote("  ", "1d").await.unwrap_err(),
        QuoteError::InvalidSymbol
    ));
    assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
}

//! Stock quote proxy.
//!
//! - FinanceHub (`FINANCEHUB_API_KEY`, bearer auth) when configured.
//! - Yahoo chart API as fallback: one month of daily candles, price = last close.

pub mod config;
pub mod errors;
pub mod model;
pub mod service;
pub mod sources;

pub use config::QuoteSettings;
pub use errors::QuoteError;
pub use model::{Candle, Quote};
pub use service::QuoteService;
pub use sources::QuoteSource;

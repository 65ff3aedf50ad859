use std::{env, time::Duration};

use crate::errors::{QuoteError, Result};

pub const DEFAULT_FINANCEHUB_BASE: &str = "https://api.financehub.example/v1";
pub const DEFAULT_YAHOO_BASE: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Upstream endpoints and credentials for the quote proxy.
#[derive(Clone)]
pub struct QuoteSettings {
    /// FinanceHub is skipped entirely when no key is configured.
    pub financehub_api_key: Option<String>,
    pub financehub_base: String,
    pub yahoo_base: String,
    pub timeout: Duration,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            financehub_api_key: None,
            financehub_base: DEFAULT_FINANCEHUB_BASE.into(),
            yahoo_base: DEFAULT_YAHOO_BASE.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl QuoteSettings {
    /// Reads `FINANCEHUB_API_KEY`, `FINANCEHUB_API_BASE` and `YAHOO_CHART_BASE`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            financehub_api_key: non_blank("FINANCEHUB_API_KEY"),
            financehub_base: endpoint("FINANCEHUB_API_BASE", defaults.financehub_base)?,
            yahoo_base: endpoint("YAHOO_CHART_BASE", defaults.yahoo_base)?,
            timeout: defaults.timeout,
        })
    }
}

impl std::fmt::Debug for QuoteSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteSettings")
            .field(
                "financehub_api_key",
                &self.financehub_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("financehub_base", &self.financehub_base)
            .field("yahoo_base", &self.yahoo_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn non_blank(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn endpoint(var: &'static str, default: String) -> Result<String> {
    let value = non_blank(var).unwrap_or(default);
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(QuoteError::Config {
            var,
            reason: format!("expected an http(s) url, got `{value}`"),
        });
    }
    Ok(value.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_api_key() {
        let settings = QuoteSettings {
            financehub_api_key: Some("secret".into()),
            ..QuoteSettings::default()
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}

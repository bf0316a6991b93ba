//! Optional market-sentiment feed (public betting %, sharp indicators).
//!
//! Never fails: missing configuration or any fetch error yields the
//! `unavailable` placeholder.

use secrecy::ExposeSecret;
use tracing::{debug, warn};

use super::DataClient;
use crate::types::MarketSignals;
use crate::upstream::FetchRequest;

const SOURCE: &str = "market_signals.custom";

/// Pull the two passthrough fields out of the payload.
pub fn parse_signals(payload: &serde_json::Value, source: &str) -> MarketSignals {
    let field = |k: &str| payload.get(k).filter(|v| !v.is_null()).cloned();
    MarketSignals {
        public_pct: field("public_pct"),
        sharp_indicators: field("sharp_indicators"),
        source: source.to_string(),
    }
}

impl DataClient {
    pub async fn fetch_market_signals(&mut self) -> MarketSignals {
        let Some(url) = self.secrets.market_signal_url.clone() else {
            debug!("No market signal feed configured");
            return MarketSignals::unavailable();
        };

        let mut request = FetchRequest::new(url.as_str());
        if let Some(key) = &self.secrets.market_signal_key {
            let bearer = format!("Bearer {}", key.expose_secret());
            request = request.header("Authorization", &bearer);
        }

        match self.upstream.get_json(SOURCE, &request).await {
            Ok(payload) => parse_signals(&payload, &url),
            Err(e) => {
                warn!(error = %e, "Market signal feed unavailable");
                MarketSignals::unavailable()
            }
        }
    }
}

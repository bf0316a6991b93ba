//! Upstream feed adapters.
//!
//! `DataClient` owns one run's `Upstream` (and therefore its status table)
//! plus the endpoint and credential settings every adapter needs. Each
//! submodule adds the fetch methods for one feed, with its parsing kept in
//! pure functions so it can be tested without a transport.

pub mod boxscores;
pub mod injuries;
pub mod lineups;
pub mod odds;
pub mod schedule;
pub mod signals;
pub mod team_stats;

use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::config::{AppConfig, EndpointsConfig, OddsConfig, Secrets};
use crate::upstream::{HttpTransport, RetryPolicy, StatusTable, Upstream};
use boxscores::BoxscorePlayer;

/// Browser-like headers required by the stats endpoint.
pub const NBA_HEADERS: &[(&str, &str)] = &[
    ("User-Agent", "Mozilla/5.0"),
    ("Accept", "application/json, text/plain, */*"),
    ("Origin", "https://www.nba.com"),
    ("Referer", "https://www.nba.com/"),
    ("Cache-Control", "no-cache"),
    ("Pragma", "no-cache"),
];

/// Per-run data client. Dropped at the end of the run together with its
/// status table and boxscore cache.
pub struct DataClient {
    upstream: Upstream,
    endpoints: EndpointsConfig,
    odds: OddsConfig,
    secrets: Secrets,
    /// game id → players; `None` remembers a lookup that already failed.
    boxscores: HashMap<String, Option<Arc<Vec<BoxscorePlayer>>>>,
}

impl DataClient {
    pub fn new(transport: Arc<dyn HttpTransport>, cfg: &AppConfig, secrets: Secrets) -> Self {
        Self {
            upstream: Upstream::new(transport, RetryPolicy::from_config(&cfg.fetch)),
            endpoints: cfg.endpoints.clone(),
            odds: cfg.odds.clone(),
            secrets,
            boxscores: HashMap::new(),
        }
    }

    pub fn upstream_status(&self) -> &StatusTable {
        self.upstream.status()
    }

    pub fn into_upstream_status(self) -> StatusTable {
        self.upstream.into_status()
    }
}

/// First calendar year of the season containing `date` (seasons start in July).
pub fn season_start_year(date: NaiveDate) -> i32 {
    if date.month() >= 7 {
        date.year()
    } else {
        date.year() - 1
    }
}

/// Season label used by the stats endpoint, e.g. `2026-27`.
pub fn season_label(date: NaiveDate) -> String {
    let start = season_start_year(date);
    format!("{start}-{:02}", (start + 1) % 100)
}

/// Decode each record on its own. Records that do not fit `T` (a `null`
/// where a string belongs, a bare number) are skipped.
pub fn decode_records<T: DeserializeOwned>(source_id: &str, records: Vec<serde_json::Value>) -> Vec<T> {
    let total = records.len();
    let decoded: Vec<T> = records
        .into_iter()
        .filter_map(|record| serde_json::from_value(record).ok())
        .collect();
    if decoded.len() < total {
        debug!(source = source_id, skipped = total - decoded.len(), "Skipped malformed records");
    }
    decoded
}

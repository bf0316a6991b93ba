//! Market odds feed.
//!
//! A single request parameterized by region, markets, bookmakers and date.
//! Without an API key the feed is simply empty; that is not an error.

use chrono::NaiveDate;
use secrecy::ExposeSecret;
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::{decode_records, DataClient};
use crate::types::{matchup_key, Fetched, MarketEvent};
use crate::upstream::{FetchError, FetchRequest};

const SOURCE: &str = "odds.the_odds_api";

/// Odds-provider team names → team codes.
const TEAM_CODES: &[(&str, &str)] = &[
    ("Atlanta Hawks", "ATL"),
    ("Boston Celtics", "BOS"),
    ("Brooklyn Nets", "BKN"),
    ("Charlotte Hornets", "CHA"),
    ("Chicago Bulls", "CHI"),
    ("Cleveland Cavaliers", "CLE"),
    ("Dallas Mavericks", "DAL"),
    ("Denver Nuggets", "DEN"),
    ("Detroit Pistons", "DET"),
    ("Golden State Warriors", "GSW"),
    ("Houston Rockets", "HOU"),
    ("Indiana Pacers", "IND"),
    ("LA Clippers", "LAC"),
    ("Los Angeles Clippers", "LAC"),
    ("Los Angeles Lakers", "LAL"),
    ("Memphis Grizzlies", "MEM"),
    ("Miami Heat", "MIA"),
    ("Milwaukee Bucks", "MIL"),
    ("Minnesota Timberwolves", "MIN"),
    ("New Orleans Pelicans", "NOP"),
    ("New York Knicks", "NYK"),
    ("Oklahoma City Thunder", "OKC"),
    ("Orlando Magic", "ORL"),
    ("Philadelphia 76ers", "PHI"),
    ("Phoenix Suns", "PHX"),
    ("Portland Trail Blazers", "POR"),
    ("Sacramento Kings", "SAC"),
    ("San Antonio Spurs", "SAS"),
    ("Toronto Raptors", "TOR"),
    ("Utah Jazz", "UTA"),
    ("Washington Wizards", "WAS"),
];

/// Team code for an odds-provider team name.
pub fn team_code(name: &str) -> Option<&'static str> {
    TEAM_CODES
        .iter()
        .find(|(full, _)| *full == name)
        .map(|(_, code)| *code)
}

/// Index events by `AWAY@HOME`. Events with unknown team names are dropped.
pub fn events_by_matchup(events: &[MarketEvent]) -> BTreeMap<String, &MarketEvent> {
    events
        .iter()
        .filter_map(|e| {
            let home = team_code(&e.home_team)?;
            let away = team_code(&e.away_team)?;
            Some((matchup_key(away, home), e))
        })
        .collect()
}

/// The feed must be an array; events inside it that do not decode, or
/// that lack a team name, are dropped on their own.
pub fn parse_odds(payload: serde_json::Value) -> Result<Vec<MarketEvent>, FetchError> {
    let records: Vec<serde_json::Value> = serde_json::from_value(payload).map_err(|e| FetchError::Malformed {
        source_id: SOURCE.to_string(),
        reason: e.to_string(),
    })?;
    Ok(decode_records::<MarketEvent>(SOURCE, records)
        .into_iter()
        .filter(|e| !e.home_team.is_empty() && !e.away_team.is_empty())
        .collect())
}

impl DataClient {
    pub async fn fetch_odds(&mut self, date: NaiveDate) -> Result<Fetched<Vec<MarketEvent>>, FetchError> {
        let Some(key) = self.secrets.odds_api_key.as_ref() else {
            warn!("No odds API key configured, odds feed will be empty");
            return Ok(Fetched::now(Vec::new()));
        };

        let request = FetchRequest::new(&self.endpoints.odds)
            .param("apiKey", key.expose_secret().as_str())
            .param("regions", self.odds.region.as_str())
            .param("markets", self.odds.markets.as_str())
            .param("bookmakers", self.odds.bookmakers.as_str())
            .param("date", date.format("%Y-%m-%d").to_string())
            .param("oddsFormat", "american");

        let payload = self.upstream.get_json(SOURCE, &request).await?;
        let events = parse_odds(payload)?;
        info!(events = events.len(), "Odds loaded");
        Ok(Fetched::now(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, Secrets};
    use crate::upstream::transport::MockHttpTransport;
    use crate::upstream::HttpResponse;
    use secrecy::SecretString;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_team_code_lookup() {
        assert_eq!(team_code("Boston Celtics"), Some("BOS"));
        assert_eq!(team_code("LA Clippers"), Some("LAC"));
        assert_eq!(team_code("Los Angeles Clippers"), Some("LAC"));
        assert_eq!(team_code("Seattle SuperSonics"), None);
    }

    #[test]
    fn test_events_by_matchup() {
        let events = parse_odds(json!([
            {"id": "e1", "home_team": "Boston Celtics", "away_team": "New York Knicks",
             "commence_time": "2026-10-19T23:30:00Z", "bookmakers": []},
            {"id": "e2", "home_team": "Nowhere", "away_team": "New York Knicks"}
        ]))
        .unwrap();
        let by = events_by_matchup(&events);
        assert_eq!(by.len(), 1);
        assert_eq!(by["NYK@BOS"].id, "e1");
    }

    #[test]
    fn test_parse_odds_rejects_error_object() {
        let err = parse_odds(json!({"message": "quota exceeded"})).unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    #[test]
    fn test_null_team_skips_only_that_event() {
        let events = parse_odds(json!([
            {"id": "bad", "home_team": null, "away_team": "New York Knicks", "bookmakers": []},
            {"id": "e1", "home_team": "Boston Celtics", "away_team": "New York Knicks", "bookmakers": []},
            {"id": "no-away", "home_team": "Miami Heat"},
            "not an event"
        ]))
        .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "e1");
    }

    #[tokio::test]
    async fn test_missing_key_yields_empty_without_request() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get().never();
        let mut client = DataClient::new(Arc::new(mock), &AppConfig::default(), Secrets::default());

        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let odds = tokio_test::assert_ok!(client.fetch_odds(date).await);
        assert!(odds.data.is_empty());
        assert!(client.upstream_status().is_empty());
    }

    #[tokio::test]
    async fn test_key_sent_but_redacted_in_status() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .withf(|req| req.params.iter().any(|(k, v)| k == "apiKey" && v == "k-123"))
            .times(1)
            .returning(|_| Ok(HttpResponse { status: 200, body: "[]".into() }));
        let secrets = Secrets {
            odds_api_key: Some(SecretString::new("k-123".into())),
            ..Default::default()
        };
        let mut client = DataClient::new(Arc::new(mock), &AppConfig::default(), secrets);

        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let odds = client.fetch_odds(date).await.unwrap();
        assert!(odds.data.is_empty());
        let st = &client.upstream_status()[SOURCE];
        assert!(st.ok);
        assert!(!st.url.contains("k-123"));
        assert!(st.url.contains("date=2026-10-19"));
    }
}

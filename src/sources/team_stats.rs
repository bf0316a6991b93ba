//! League team statistics across several measure types.
//!
//! Eight parameterized queries are issued per run and merged into one
//! `TeamStatRow` per team. Teams are keyed off the season Advanced set;
//! every other query fills its own named section of the row.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::{season_label, DataClient, NBA_HEADERS};
use crate::types::{StatSet, TeamStatRow, TeamStats};
use crate::upstream::{FetchError, FetchRequest};

/// One parameterized stats query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatQuery {
    pub measure: &'static str,
    pub last_n: u32,
    /// `""` (all games), `"Home"` or `"Road"`.
    pub location: &'static str,
}

impl StatQuery {
    const fn new(measure: &'static str, last_n: u32, location: &'static str) -> Self {
        Self { measure, last_n, location }
    }

    pub fn source_id(&self) -> String {
        let location = if self.location.is_empty() { "all" } else { self.location };
        format!("team_stats.{}.{}.{}", self.measure, self.last_n, location)
    }
}

pub const SEASON_ADVANCED: StatQuery = StatQuery::new("Advanced", 0, "");
pub const LAST10_ADVANCED: StatQuery = StatQuery::new("Advanced", 10, "");
pub const BASE: StatQuery = StatQuery::new("Base", 0, "");
pub const FOUR_FACTORS: StatQuery = StatQuery::new("Four Factors", 0, "");
pub const SCORING: StatQuery = StatQuery::new("Scoring", 0, "");
pub const MISC: StatQuery = StatQuery::new("Misc", 0, "");
pub const HOME_SPLIT: StatQuery = StatQuery::new("Advanced", 0, "Home");
pub const AWAY_SPLIT: StatQuery = StatQuery::new("Advanced", 0, "Road");

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    result_sets: Vec<ResultSet>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ResultSet {
    #[serde(default)]
    headers: Vec<String>,
    #[serde(default)]
    row_set: Vec<serde_json::Value>,
}

/// Rows of the first result set, keyed by `TEAM_ABBREVIATION`.
///
/// Column names are lowercased; non-numeric cells become 0.0. Rows that
/// are not arrays or carry no team abbreviation are skipped.
pub fn parse_stat_rows(payload: &serde_json::Value) -> Result<BTreeMap<String, StatSet>, String> {
    let resp = StatsResponse::deserialize(payload).map_err(|e| e.to_string())?;
    let set = resp
        .result_sets
        .into_iter()
        .next()
        .ok_or_else(|| "no result sets".to_string())?;

    let team_col = set.headers.iter().position(|h| h == "TEAM_ABBREVIATION");
    let mut out = BTreeMap::new();

    for row in set.row_set {
        let Some(row) = row.as_array() else {
            debug!("Skipped non-array stats row");
            continue;
        };
        let team = team_col
            .and_then(|i| row.get(i))
            .and_then(|v| v.as_str())
            .map(str::trim)
            .unwrap_or_default();
        if team.is_empty() {
            debug!("Skipped stats row without team abbreviation");
            continue;
        }
        let stats: StatSet = set
            .headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.to_lowercase(), v.as_f64().unwrap_or(0.0)))
            .collect();
        out.insert(team.to_string(), stats);
    }
    Ok(out)
}

/// Fold the individual query results into one row per team.
pub fn merge_team_stats(mut sets: BTreeMap<StatQueryKey, BTreeMap<String, StatSet>>) -> TeamStats {
    let mut take = |k: StatQueryKey| sets.remove(&k).unwrap_or_default();
    let season = take(StatQueryKey::SeasonAdvanced);
    let mut last10 = take(StatQueryKey::Last10Advanced);
    let mut base = take(StatQueryKey::Base);
    let mut four = take(StatQueryKey::FourFactors);
    let mut scoring = take(StatQueryKey::Scoring);
    let mut misc = take(StatQueryKey::Misc);
    let mut home = take(StatQueryKey::HomeSplit);
    let mut away = take(StatQueryKey::AwaySplit);

    season
        .into_iter()
        .map(|(team, advanced)| {
            let row = TeamStatRow {
                advanced_last10: last10.remove(&team).unwrap_or_default(),
                base: base.remove(&team).unwrap_or_default(),
                four_factors: four.remove(&team).unwrap_or_default(),
                scoring: scoring.remove(&team).unwrap_or_default(),
                misc: misc.remove(&team).unwrap_or_default(),
                home_split: home.remove(&team).unwrap_or_default(),
                away_split: away.remove(&team).unwrap_or_default(),
                advanced,
            };
            (team, row)
        })
        .collect()
}

/// Which section a query result feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatQueryKey {
    SeasonAdvanced,
    Last10Advanced,
    Base,
    FourFactors,
    Scoring,
    Misc,
    HomeSplit,
    AwaySplit,
}

const QUERIES: &[(StatQueryKey, StatQuery)] = &[
    (StatQueryKey::SeasonAdvanced, SEASON_ADVANCED),
    (StatQueryKey::Last10Advanced, LAST10_ADVANCED),
    (StatQueryKey::Base, BASE),
    (StatQueryKey::FourFactors, FOUR_FACTORS),
    (StatQueryKey::Scoring, SCORING),
    (StatQueryKey::Misc, MISC),
    (StatQueryKey::HomeSplit, HOME_SPLIT),
    (StatQueryKey::AwaySplit, AWAY_SPLIT),
];

fn build_request(url: &str, query: &StatQuery, season: &str) -> FetchRequest {
    let mut req = FetchRequest::new(url);
    for (name, value) in NBA_HEADERS {
        req = req.header(name, value);
    }
    let params: [(&str, String); 33] = [
        ("College", String::new()),
        ("Conference", String::new()),
        ("Country", String::new()),
        ("DateFrom", String::new()),
        ("DateTo", String::new()),
        ("Division", String::new()),
        ("GameScope", String::new()),
        ("GameSegment", String::new()),
        ("Height", String::new()),
        ("LastNGames", query.last_n.to_string()),
        ("LeagueID", "00".into()),
        ("Location", query.location.into()),
        ("MeasureType", query.measure.into()),
        ("Month", "0".into()),
        ("OpponentTeamID", "0".into()),
        ("Outcome", String::new()),
        ("PORound", "0".into()),
        ("PaceAdjust", "N".into()),
        ("PerMode", "Per100Possessions".into()),
        ("Period", "0".into()),
        ("PlayerExperience", String::new()),
        ("PlayerPosition", String::new()),
        ("PlusMinus", "N".into()),
        ("Rank", "N".into()),
        ("Season", season.into()),
        ("SeasonSegment", String::new()),
        ("SeasonType", "Regular Season".into()),
        ("ShotClockRange", String::new()),
        ("StarterBench", String::new()),
        ("TeamID", "0".into()),
        ("TwoWay", "0".into()),
        ("VsConference", String::new()),
        ("VsDivision", String::new()),
    ];
    for (name, value) in params {
        req = req.param(name, value);
    }
    req
}

impl DataClient {
    /// Issue every stats query in sequence and merge the results.
    /// Any single query failing fails the whole set.
    pub async fn fetch_team_stats(&mut self, date: NaiveDate) -> Result<TeamStats, FetchError> {
        let season = season_label(date);
        let mut sets = BTreeMap::new();

        for (key, query) in QUERIES {
            let source_id = query.source_id();
            let request = build_request(&self.endpoints.team_stats, query, &season);
            let payload = self.upstream.get_json(&source_id, &request).await?;
            let rows = parse_stat_rows(&payload).map_err(|reason| FetchError::Malformed {
                source_id: source_id.clone(),
                reason,
            })?;
            debug!(source = %source_id, teams = rows.len(), "Stat set loaded");
            sets.insert(*key, rows);
        }

        let merged = merge_team_stats(sets);
        info!(teams = merged.len(), season = %season, "Team statistics merged");
        Ok(merged)
    }
}

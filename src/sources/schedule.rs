//! Schedule feeds with an ordered fallback chain.
//!
//! The primary feed is the season schedule keyed by season year; the
//! static CDN schedule is tried when it fails. The first provider that
//! succeeds wins; if all fail their errors are combined into one.
//!
//! The primary season feed is also the source of recent completed games
//! per team (see `fetch_recent_games`).

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::{decode_records, season_start_year, DataClient};
use crate::types::{Fetched, Game, RecentGames};
use crate::upstream::{FetchError, FetchRequest, Upstream};

/// Status values meaning scheduled, live, or final.
const LISTED_STATUSES: &[i64] = &[1, 2, 3];
const FINAL_STATUS: i64 = 3;

const PRIMARY_SOURCE: &str = "schedule.data_nba_net";
const FALLBACK_SOURCE: &str = "schedule.cdn_static";
const RECENT_SOURCE: &str = "recent_games.data_nba_net";

/// Completed games kept per team for eligibility and form.
pub const RECENT_GAMES_PER_TEAM: usize = 3;

// ---------------------------------------------------------------------------
// Primary feed (season schedule) response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
struct SeasonSchedule {
    #[serde(default)]
    league: SeasonLeague,
}

#[derive(Debug, Deserialize, Default)]
struct SeasonLeague {
    /// Raw records, decoded one at a time into `SeasonGame`.
    #[serde(default)]
    standard: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SeasonGame {
    #[serde(default)]
    game_id: String,
    /// `YYYYMMDD`, US Eastern calendar day.
    #[serde(default)]
    start_date_eastern: String,
    #[serde(default, rename = "startTimeUTC")]
    start_time_utc: String,
    #[serde(default)]
    status_num: Option<i64>,
    #[serde(default)]
    h_team: TriCodeTeam,
    #[serde(default)]
    v_team: TriCodeTeam,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TriCodeTeam {
    #[serde(default)]
    tri_code: String,
}

// ---------------------------------------------------------------------------
// Fallback feed (static CDN) response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CdnSchedule {
    #[serde(default)]
    league_schedule: CdnLeagueSchedule,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CdnLeagueSchedule {
    #[serde(default)]
    game_dates: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CdnGameDate {
    /// `MM/DD/YYYY 00:00:00` (or ISO in some mirrors).
    #[serde(default)]
    game_date: String,
    #[serde(default)]
    games: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CdnGame {
    #[serde(default)]
    game_id: String,
    #[serde(default)]
    game_status: Option<i64>,
    #[serde(default, rename = "gameDateTimeUTC")]
    game_date_time_utc: String,
    #[serde(default)]
    home_team: CdnTeam,
    #[serde(default)]
    away_team: CdnTeam,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CdnTeam {
    #[serde(default)]
    team_tricode: String,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn malformed(source_id: &str, e: serde_json::Error) -> FetchError {
    FetchError::Malformed {
        source_id: source_id.to_string(),
        reason: e.to_string(),
    }
}

/// Games on `date` from the season feed (date compared as Eastern `YYYYMMDD`).
pub fn parse_primary_schedule(payload: &serde_json::Value, date: NaiveDate) -> Result<Vec<Game>, serde_json::Error> {
    let feed = SeasonSchedule::deserialize(payload)?;
    let target = date.format("%Y%m%d").to_string();

    Ok(decode_records::<SeasonGame>(PRIMARY_SOURCE, feed.league.standard)
        .into_iter()
        .filter(|g| g.start_date_eastern == target)
        .filter(|g| !g.h_team.tri_code.is_empty() && !g.v_team.tri_code.is_empty())
        .filter(|g| g.status_num.is_some_and(|s| LISTED_STATUSES.contains(&s)))
        .map(|g| Game {
            id: g.game_id,
            home_team: g.h_team.tri_code,
            away_team: g.v_team.tri_code,
            tipoff_utc: g.start_time_utc,
        })
        .collect())
}

/// Normalise a CDN `gameDate` to ISO `YYYY-MM-DD`.
fn cdn_day(raw: &str) -> Option<NaiveDate> {
    let first = raw.split_whitespace().next().unwrap_or("");
    NaiveDate::parse_from_str(first, "%m/%d/%Y")
        .ok()
        .or_else(|| raw.get(..10).and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()))
}

/// Games on `date` from the static CDN feed.
pub fn parse_fallback_schedule(payload: &serde_json::Value, date: NaiveDate) -> Result<Vec<Game>, serde_json::Error> {
    let feed = CdnSchedule::deserialize(payload)?;

    Ok(decode_records::<CdnGameDate>(FALLBACK_SOURCE, feed.league_schedule.game_dates)
        .into_iter()
        .filter(|day| cdn_day(&day.game_date) == Some(date))
        .flat_map(|day| decode_records::<CdnGame>(FALLBACK_SOURCE, day.games))
        .filter(|g| !g.home_team.team_tricode.is_empty() && !g.away_team.team_tricode.is_empty())
        .filter(|g| g.game_status.map_or(true, |s| LISTED_STATUSES.contains(&s)))
        .map(|g| Game {
            id: g.game_id,
            home_team: g.home_team.team_tricode,
            away_team: g.away_team.team_tricode,
            tipoff_utc: g.game_date_time_utc,
        })
        .collect())
}

/// Up to `RECENT_GAMES_PER_TEAM` most recent final games per team, newest
/// first. Equal dates keep feed order.
pub fn parse_recent_games(payload: &serde_json::Value) -> Result<RecentGames, serde_json::Error> {
    let feed = SeasonSchedule::deserialize(payload)?;
    let mut by_team: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();

    for g in decode_records::<SeasonGame>(RECENT_SOURCE, feed.league.standard) {
        if g.status_num != Some(FINAL_STATUS) || g.game_id.is_empty() || g.start_date_eastern.is_empty() {
            continue;
        }
        for tri in [&g.h_team.tri_code, &g.v_team.tri_code] {
            if !tri.is_empty() {
                by_team
                    .entry(tri.clone())
                    .or_default()
                    .push((g.start_date_eastern.clone(), g.game_id.clone()));
            }
        }
    }

    Ok(by_team
        .into_iter()
        .map(|(tri, mut games)| {
            // Stable sort: ties stay in feed order.
            games.sort_by(|a, b| b.0.cmp(&a.0));
            let ids = games
                .into_iter()
                .take(RECENT_GAMES_PER_TEAM)
                .map(|(_, id)| id)
                .collect();
            (tri, ids)
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// One schedule source in the fallback chain.
#[async_trait]
pub trait ScheduleProvider: Send + Sync {
    /// Label used in the combined error message.
    fn name(&self) -> &str;

    async fn fetch(&self, upstream: &mut Upstream, date: NaiveDate) -> Result<Vec<Game>, FetchError>;
}

/// Season schedule keyed by season start year.
pub struct SeasonScheduleProvider {
    base_url: String,
}

impl SeasonScheduleProvider {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string() }
    }

    fn request(&self, date: NaiveDate) -> FetchRequest {
        FetchRequest::new(format!("{}/{}/schedule.json", self.base_url, season_start_year(date)))
    }
}

#[async_trait]
impl ScheduleProvider for SeasonScheduleProvider {
    fn name(&self) -> &str {
        "data.nba.net"
    }

    async fn fetch(&self, upstream: &mut Upstream, date: NaiveDate) -> Result<Vec<Game>, FetchError> {
        let payload = upstream.get_json(PRIMARY_SOURCE, &self.request(date)).await?;
        parse_primary_schedule(&payload, date).map_err(|e| malformed(PRIMARY_SOURCE, e))
    }
}

/// League-wide static CDN schedule.
pub struct CdnScheduleProvider {
    url: String,
}

impl CdnScheduleProvider {
    pub fn new(url: &str) -> Self {
        Self { url: url.to_string() }
    }
}

#[async_trait]
impl ScheduleProvider for CdnScheduleProvider {
    fn name(&self) -> &str {
        "cdn static schedule"
    }

    async fn fetch(&self, upstream: &mut Upstream, date: NaiveDate) -> Result<Vec<Game>, FetchError> {
        let payload = upstream.get_json(FALLBACK_SOURCE, &FetchRequest::new(&self.url)).await?;
        parse_fallback_schedule(&payload, date).map_err(|e| malformed(FALLBACK_SOURCE, e))
    }
}

/// Try each provider in order; first success short-circuits.
pub async fn fetch_with_fallback(
    providers: &[Box<dyn ScheduleProvider>],
    upstream: &mut Upstream,
    date: NaiveDate,
) -> Result<Vec<Game>, FetchError> {
    let mut errors = Vec::new();
    for provider in providers {
        match provider.fetch(upstream, date).await {
            Ok(games) => {
                info!(provider = provider.name(), count = games.len(), %date, "Schedule loaded");
                return Ok(games);
            }
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "Schedule provider failed, trying next");
                errors.push(format!("{} failed: {e}", provider.name()));
            }
        }
    }
    Err(FetchError::AllProvidersFailed(errors))
}

// ---------------------------------------------------------------------------
// DataClient
// ---------------------------------------------------------------------------

impl DataClient {
    fn schedule_chain(&self) -> Vec<Box<dyn ScheduleProvider>> {
        vec![
            Box::new(SeasonScheduleProvider::new(&self.endpoints.schedule_primary)),
            Box::new(CdnScheduleProvider::new(&self.endpoints.schedule_fallback)),
        ]
    }

    /// Today's confirmed games via the fallback chain.
    pub async fn fetch_schedule(&mut self, date: NaiveDate) -> Result<Fetched<Vec<Game>>, FetchError> {
        let chain = self.schedule_chain();
        let games = fetch_with_fallback(&chain, &mut self.upstream, date).await?;
        Ok(Fetched::now(games))
    }

    /// Most recent completed games per team from the season feed.
    pub async fn fetch_recent_games(&mut self, date: NaiveDate) -> Result<RecentGames, FetchError> {
        let request = SeasonScheduleProvider::new(&self.endpoints.schedule_primary).request(date);
        let payload = self.upstream.get_json(RECENT_SOURCE, &request).await?;
        parse_recent_games(&payload).map_err(|e| malformed(RECENT_SOURCE, e))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

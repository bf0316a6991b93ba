//! Per-game player boxscores, recent-activity checks and player form.
//!
//! Boxscores are memoized for the lifetime of the `DataClient` (one run),
//! including lookups that failed, so a dead game id costs one retry cycle
//! rather than one per player. Form is recomputed from the cached lines on
//! every call.

use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::DataClient;
use crate::model::form::{summarize_form, GameLine};
use crate::types::{PlayerForm, RecentGames};
use crate::upstream::FetchRequest;

/// Recent games considered for player form.
pub const FORM_WINDOW: usize = 5;
/// Team must have this many recent games for the activity check.
pub const ACTIVITY_WINDOW: usize = 3;
/// Appearances within the activity window required to count as active.
pub const MIN_APPEARANCES: usize = 2;

/// One player's line in one game.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxscorePlayer {
    /// `first family`
    pub name: String,
    pub line: GameLine,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
struct BoxscoreFeed {
    #[serde(default)]
    game: BoxscoreGame,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct BoxscoreGame {
    #[serde(default)]
    home_team: BoxscoreTeam,
    #[serde(default)]
    away_team: BoxscoreTeam,
}

#[derive(Debug, Deserialize, Default)]
struct BoxscoreTeam {
    #[serde(default)]
    players: Vec<RawPlayer>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawPlayer {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    family_name: String,
    #[serde(default)]
    statistics: RawStats,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawStats {
    #[serde(default)]
    points: Option<f64>,
    #[serde(default)]
    rebounds_total: Option<f64>,
    #[serde(default)]
    assists: Option<f64>,
    #[serde(default)]
    three_pointers_made: Option<f64>,
    #[serde(default)]
    minutes: Option<String>,
}

/// Whole minutes from either `MM:SS` or ISO-8601 `PT34M12.00S`.
pub fn parse_minutes(raw: &str) -> f64 {
    let raw = raw.trim();
    let digits = if let Some(rest) = raw.strip_prefix("PT") {
        rest.split('M').next().unwrap_or("")
    } else {
        raw.split(':').next().unwrap_or("")
    };
    digits.parse::<f64>().map(f64::trunc).unwrap_or(0.0)
}

/// Home players followed by away players.
pub fn parse_boxscore(payload: &serde_json::Value) -> Result<Vec<BoxscorePlayer>, serde_json::Error> {
    let feed = BoxscoreFeed::deserialize(payload)?;
    Ok(feed
        .game
        .home_team
        .players
        .into_iter()
        .chain(feed.game.away_team.players)
        .map(|p| {
            let s = p.statistics;
            BoxscorePlayer {
                name: format!("{} {}", p.first_name, p.family_name).trim().to_string(),
                line: GameLine {
                    minutes: s.minutes.as_deref().map(parse_minutes).unwrap_or(0.0),
                    points: s.points.unwrap_or(0.0),
                    rebounds: s.rebounds_total.unwrap_or(0.0),
                    assists: s.assists.unwrap_or(0.0),
                    threes: s.three_pointers_made.unwrap_or(0.0),
                },
            }
        })
        .collect())
}

impl DataClient {
    /// Players for one game, or `None` when the lookup failed.
    pub async fn boxscore(&mut self, game_id: &str) -> Option<Arc<Vec<BoxscorePlayer>>> {
        if let Some(cached) = self.boxscores.get(game_id) {
            return cached.clone();
        }

        let source_id = format!("boxscore.{game_id}");
        let url = format!(
            "{}/boxscore_{game_id}.json",
            self.endpoints.boxscore.trim_end_matches('/')
        );
        let players = match self.upstream.get_json(&source_id, &FetchRequest::new(url)).await {
            Ok(payload) => match parse_boxscore(&payload) {
                Ok(players) => Some(Arc::new(players)),
                Err(e) => {
                    debug!(game_id, error = %e, "Unreadable boxscore, skipping");
                    None
                }
            },
            Err(e) => {
                debug!(game_id, error = %e, "Boxscore unavailable, skipping");
                None
            }
        };

        self.boxscores.insert(game_id.to_string(), players.clone());
        players
    }

    /// Player appeared in at least 2 of the team's last 3 completed games.
    pub async fn played_recently(&mut self, player: &str, team: &str, recent: &RecentGames) -> bool {
        let ids = match recent.get(team) {
            Some(ids) if ids.len() >= ACTIVITY_WINDOW => ids,
            _ => return false,
        };

        let mut appearances = 0;
        for gid in ids.iter().take(ACTIVITY_WINDOW) {
            if let Some(players) = self.boxscore(gid).await {
                if players.iter().any(|p| p.name == player) {
                    appearances += 1;
                }
            }
        }
        appearances >= MIN_APPEARANCES
    }

    /// Recent-form summary over the team's last up-to-5 games.
    pub async fn player_form(&mut self, player: &str, team: &str, recent: &RecentGames) -> PlayerForm {
        let ids: Vec<String> = recent
            .get(team)
            .map(|ids| ids.iter().take(FORM_WINDOW).cloned().collect())
            .unwrap_or_default();

        let mut lines = Vec::new();
        for gid in &ids {
            if let Some(players) = self.boxscore(gid).await {
                lines.extend(players.iter().filter(|p| p.name == player).map(|p| p.line));
            }
        }
        summarize_form(&lines)
    }
}

//! Report assembly: drives one run from fetch to ranked picks.
//!
//! Each run gets a fresh `DataClient` (and with it a fresh upstream status
//! table and boxscore cache) plus a fresh `Simulator`; nothing survives
//! between reports. Feed failures degrade to empty defaults and are listed
//! in `upstream_failures`; no failure aborts the report.

pub mod analytics;

use chrono::{DateTime, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{AppConfig, Secrets};
use crate::model::{project_game, Simulator};
use crate::sources::odds::events_by_matchup;
use crate::sources::DataClient;
use crate::strategy::edge::{EligiblePlayer, GamePricing};
use crate::strategy::{alt_lines, correlated_parlay, rank_picks, AltLine, Parlay};
use crate::types::{BetPick, Fetched, Game, Injuries, Lineups, RiskLevel, TeamStats};
use crate::upstream::{FetchError, HttpTransport, StatusTable};
use crate::verify::{verify_feeds, FeedSnapshot};
use analytics::{GameAnalytics, GameStatus};

pub const NO_EV_MSG: &str = "No positive expected value opportunities today.";
pub const DEGRADED_MSG: &str = "Live data partially unavailable. Degraded-mode analysis generated.";
pub const INVALID_DATE_MSG: &str = "Invalid date format. Use YYYY-MM-DD.";

/// Injury statuses (substring match) that exclude a player.
pub const INACTIVE_FLAGS: [&str; 6] = ["OUT", "DOUBTFUL", "INACTIVE", "G LEAGUE", "SUSPENSION", "OFS"];
/// Listed starters required per side.
pub const MIN_LISTED_PER_SIDE: usize = 5;
/// Eligible players required across both sides.
pub const MIN_ELIGIBLE_PLAYERS: usize = 8;
/// Reasons shown per ranked pick.
pub const MAX_REASONS: usize = 4;

// ---------------------------------------------------------------------------
// Output document
// ---------------------------------------------------------------------------

/// A ranked pick as rendered in the report: percentages with one decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPick {
    pub matchup: String,
    pub market_type: String,
    pub line_odds: String,
    pub projected_probability: f64,
    pub implied_probability: f64,
    pub edge_pct: f64,
    pub projected_final_score: Option<String>,
    pub key_data_reasons: Vec<String>,
    pub risk_level: RiskLevel,
    pub suggested_unit_size: Decimal,
}

fn pct1(p: f64) -> f64 {
    (p * 1000.0).round() / 10.0
}

impl From<&BetPick> for RankedPick {
    fn from(p: &BetPick) -> Self {
        Self {
            matchup: p.matchup.clone(),
            market_type: p.market_type.clone(),
            line_odds: p.book_label.clone(),
            projected_probability: pct1(p.projected_probability),
            implied_probability: pct1(p.implied_probability),
            edge_pct: pct1(p.edge),
            projected_final_score: p.projected_score.clone(),
            key_data_reasons: p.reasons.iter().take(MAX_REASONS).cloned().collect(),
            risk_level: p.risk_level,
            suggested_unit_size: p.unit_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataIntegrity {
    pub daily_reset_protocol: String,
    pub fresh_pull_only: bool,
    pub uncertainty_flagging: bool,
    pub inactive_players_excluded: bool,
}

impl Default for DataIntegrity {
    fn default() -> Self {
        Self {
            daily_reset_protocol: "completed".to_string(),
            fresh_pull_only: true,
            uncertainty_flagging: true,
            inactive_players_excluded: true,
        }
    }
}

/// Root report document.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub app_name: String,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// ISO run date.
    pub date: String,
    pub manual_override_used: bool,
    /// `ok`, `degraded`, or the no-opportunities message.
    pub status: String,
    pub message: String,
    pub confirmed_games_today: Vec<String>,
    pub ranked_picks: Vec<RankedPick>,
    pub status_message: String,
    pub alt_line_high_upside: Vec<AltLine>,
    pub correlated_parlay: Option<Parlay>,
    pub game_analytics: Vec<GameAnalytics>,
    pub degraded_mode: bool,
    pub upstream_failures: Vec<String>,
    pub upstream_api_status: StatusTable,
    pub data_integrity: DataIntegrity,
}

/// Response for a request that could not be run (bad date input).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbortedReport {
    pub app_name: String,
    pub status: String,
    pub message: String,
}

impl AbortedReport {
    pub fn invalid_date(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            status: "aborted".to_string(),
            message: INVALID_DATE_MSG.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Whether an uppercased injury status rules the player out.
pub fn is_inactive(status: &str) -> bool {
    let s = status.to_uppercase();
    INACTIVE_FLAGS.iter().any(|flag| s.contains(flag))
}

/// Lineup names that are not blank.
pub fn listed_players(lineup: &[String]) -> impl Iterator<Item = &String> {
    lineup.iter().filter(|name| !name.trim().is_empty())
}

/// Run date: the explicit date only when overrides are allowed.
pub fn resolve_run_date(today: NaiveDate, explicit: Option<NaiveDate>, allow_override: bool) -> (NaiveDate, bool) {
    match explicit {
        Some(d) if allow_override => (d, true),
        _ => (today, false),
    }
}

/// True when the earliest tip-off is between now and `window_mins` ahead.
pub fn in_pretip_window(games: &[Game], now: DateTime<Utc>, window_mins: i64) -> bool {
    let Some(first_tip) = games.iter().filter_map(Game::tipoff).min() else {
        return false;
    };
    let delta = (first_tip - now).num_seconds();
    (0..=window_mins * 60).contains(&delta)
}

/// Unwrap a feed result, recording the failure and substituting `default`.
fn degrade<T>(label: &str, result: Result<T, FetchError>, default: T, issues: &mut Vec<String>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            warn!(feed = label, error = %e, "Feed failed, continuing with empty data");
            issues.push(format!("{label} failed after retries: {e}"));
            default
        }
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Builds reports on demand. Holds only configuration; all run state lives
/// inside `generate_for`.
pub struct ReportGenerator {
    transport: Arc<dyn HttpTransport>,
    config: AppConfig,
    secrets: Secrets,
}

impl ReportGenerator {
    pub fn new(transport: Arc<dyn HttpTransport>, config: AppConfig, secrets: Secrets) -> Self {
        Self { transport, config, secrets }
    }

    pub fn app_name(&self) -> &str {
        &self.config.app.name
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Fresh per-run data client.
    pub fn data_client(&self) -> DataClient {
        DataClient::new(self.transport.clone(), &self.config, self.secrets.clone())
    }

    /// Report for today (server-local date), or `explicit` when overrides are allowed.
    pub async fn generate(&self, explicit: Option<NaiveDate>, allow_override: bool) -> Report {
        let today = Local::now().date_naive();
        self.generate_for(today, Utc::now(), explicit, allow_override).await
    }

    /// Same as `generate`, with the clock supplied by the caller.
    pub async fn generate_for(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
        explicit: Option<NaiveDate>,
        allow_override: bool,
    ) -> Report {
        let (run_date, override_used) = resolve_run_date(today, explicit, allow_override);
        let run_id = Uuid::new_v4();
        info!(%run_id, date = %run_date, override_used, "Report run starting");

        let mut client = self.data_client();
        let mut issues: Vec<String> = Vec::new();

        // -- Fetch (strictly sequential) -----------------------------------

        let schedule = client.fetch_schedule(run_date).await;
        let games = degrade("schedule", schedule, Fetched { data: Vec::new(), fetched_at: now }, &mut issues);
        let injuries = client.fetch_injuries().await;
        let injuries = degrade("injuries", injuries, Fetched { data: Injuries::new(), fetched_at: now }, &mut issues);
        let lineups = client.fetch_lineups().await;
        let lineups = degrade("lineups", lineups, Fetched { data: Lineups::new(), fetched_at: now }, &mut issues);
        let odds = client.fetch_odds(run_date).await;
        let odds = degrade("odds", odds, Fetched { data: Vec::new(), fetched_at: now }, &mut issues);
        let team_stats = client.fetch_team_stats(run_date).await;
        let team_stats = degrade("team_stats", team_stats, TeamStats::new(), &mut issues);
        let recent = client.fetch_recent_games(run_date).await;
        let recent = degrade("recent_games", recent, Default::default(), &mut issues);
        let signals = client.fetch_market_signals().await;

        // -- Verify --------------------------------------------------------

        let snapshot = FeedSnapshot {
            games: &games.data,
            injuries: &injuries.data,
            lineups: &lineups.data,
            odds: &odds.data,
            fetched_at: BTreeMap::from([
                ("schedule", games.fetched_at),
                ("injuries", injuries.fetched_at),
                ("lineups", lineups.fetched_at),
                ("odds", odds.fetched_at),
            ]),
        };
        let verification = verify_feeds(&snapshot, run_date, now);
        let degraded_mode = !verification.ok() || !issues.is_empty();
        issues.extend(verification.issues);

        // -- Per game ------------------------------------------------------

        let simulations = self.config.simulation.effective_simulations();
        let mut sim = Simulator::new(simulations, self.config.simulation.seed);
        let events = events_by_matchup(&odds.data);
        let mut picks: Vec<BetPick> = Vec::new();
        let mut game_analytics = Vec::with_capacity(games.data.len());

        for game in &games.data {
            let home_lineup = lineups.data.get(&game.home_team).map(Vec::as_slice).unwrap_or(&[]);
            let away_lineup = lineups.data.get(&game.away_team).map(Vec::as_slice).unwrap_or(&[]);
            if listed_players(home_lineup).count() < MIN_LISTED_PER_SIDE
                || listed_players(away_lineup).count() < MIN_LISTED_PER_SIDE
            {
                debug!(game = %game, "Insufficient lineup data");
                game_analytics.push(GameAnalytics::skipped(game, &team_stats, GameStatus::InsufficientLineupData));
                continue;
            }

            let mut eligible = Vec::new();
            for (team, lineup) in [(&game.home_team, home_lineup), (&game.away_team, away_lineup)] {
                let team_injuries = injuries.data.get(team);
                for player in listed_players(lineup) {
                    let status = team_injuries
                        .and_then(|t| t.get(player))
                        .cloned()
                        .unwrap_or_else(|| "ACTIVE".to_string());
                    if is_inactive(&status) {
                        debug!(player = %player, status = %status, "Excluded by injury status");
                        continue;
                    }
                    if !client.played_recently(player, team, &recent).await {
                        debug!(player = %player, team = %team, "Excluded as not recently active");
                        continue;
                    }
                    let form = client.player_form(player, team, &recent).await;
                    eligible.push(EligiblePlayer {
                        team: team.clone(),
                        name: player.clone(),
                        status,
                        form,
                    });
                }
            }

            if eligible.len() < MIN_ELIGIBLE_PLAYERS {
                debug!(game = %game, eligible = eligible.len(), "Insufficient active players");
                game_analytics.push(GameAnalytics::skipped(game, &team_stats, GameStatus::InsufficientActivePlayers));
                continue;
            }

            let Some(&event) = events.get(&game.matchup_key()) else {
                debug!(game = %game, "No market event for matchup");
                game_analytics.push(GameAnalytics::skipped(game, &team_stats, GameStatus::MissingMarketData));
                continue;
            };

            let projection = project_game(&game.home_team, &game.away_team, &team_stats);
            let pricing = GamePricing {
                game,
                event,
                projection,
                eligible: &eligible,
            };
            let found = pricing.find_picks(&mut sim);
            debug!(game = %game, picks = found.len(), "Game priced");
            picks.extend(found);

            game_analytics.push(GameAnalytics::priced(
                game,
                &team_stats,
                &projection,
                &eligible,
                &signals,
                simulations,
            ));
        }

        // -- Assemble ------------------------------------------------------

        let ranked = rank_picks(picks);
        let ranked_picks: Vec<RankedPick> = ranked.iter().map(RankedPick::from).collect();
        let has_picks = !ranked_picks.is_empty();

        let status = if degraded_mode {
            "degraded".to_string()
        } else if has_picks {
            "ok".to_string()
        } else {
            NO_EV_MSG.to_string()
        };
        let message = if degraded_mode {
            DEGRADED_MSG.to_string()
        } else {
            status.clone()
        };
        let status_message = if has_picks { "ok" } else { NO_EV_MSG }.to_string();

        let report = Report {
            app_name: self.config.app.name.clone(),
            run_id,
            generated_at: now,
            date: run_date.format("%Y-%m-%d").to_string(),
            manual_override_used: override_used,
            status,
            message,
            confirmed_games_today: games.data.iter().map(Game::label).collect(),
            alt_line_high_upside: alt_lines(&ranked),
            correlated_parlay: correlated_parlay(&ranked),
            ranked_picks,
            status_message,
            game_analytics,
            degraded_mode,
            upstream_failures: issues,
            upstream_api_status: client.into_upstream_status(),
            data_integrity: DataIntegrity::default(),
        };

        info!(
            %run_id,
            status = %report.status,
            games = report.confirmed_games_today.len(),
            picks = report.ranked_picks.len(),
            failures = report.upstream_failures.len(),
            "Report complete"
        );
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

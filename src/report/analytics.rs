//! Per-game analytics blocks of the report.
//!
//! Values come straight from the merged team statistics and the model
//! projection. Metrics the model does not compute are carried as
//! `NotComputed` so consumers see them as explicitly unverified.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::projection::{DEFAULT_PACE, MARGIN_SD};
use crate::model::Projection;
use crate::strategy::edge::EligiblePlayer;
use crate::types::{Game, MarketSignals, NotComputed, TeamStatRow, TeamStats};

/// Fatigue index per point of pace differential.
pub const FATIGUE_PER_PACE: f64 = 0.1;

/// Why a game produced no picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InsufficientLineupData,
    InsufficientActivePlayers,
    MissingMarketData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeAwaySplits {
    pub home_net_rating: Option<f64>,
    pub away_net_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMetrics {
    pub offensive_rating_season: Option<f64>,
    pub offensive_rating_last10: Option<f64>,
    pub defensive_rating_season: Option<f64>,
    pub defensive_rating_last10: Option<f64>,
    pub net_rating: Option<f64>,
    pub efg_pct: Option<f64>,
    pub ts_pct: Option<f64>,
    pub pace: Option<f64>,
    pub turnover_pct: Option<f64>,
    pub off_rebound_pct: Option<f64>,
    pub def_rebound_pct: Option<f64>,
    pub free_throw_rate: Option<f64>,
    pub points_per_possession: Option<f64>,
    pub assist_pct: Option<f64>,
    pub threepa_rate: f64,
    pub paint_points_allowed: Option<f64>,
    pub rim_protection_pct: NotComputed,
    pub pick_and_roll_def_efficiency: NotComputed,
    pub starting_lineup_net_rating: NotComputed,
    pub bench_net_rating: NotComputed,
    pub home_away_splits: HomeAwaySplits,
    pub clutch_net_rating: NotComputed,
}

impl TeamMetrics {
    pub fn from_row(row: Option<&TeamStatRow>) -> Self {
        let empty = TeamStatRow::default();
        let s = row.unwrap_or(&empty);
        let adv = |k: &str| s.advanced.get(k);

        let fg3a = s.base.get("fg3a").unwrap_or(0.0);
        let fga = s.base.get("fga").unwrap_or(1.0).max(1.0);

        Self {
            offensive_rating_season: adv("off_rating"),
            offensive_rating_last10: s.advanced_last10.get("off_rating"),
            defensive_rating_season: adv("def_rating"),
            defensive_rating_last10: s.advanced_last10.get("def_rating"),
            net_rating: adv("net_rating"),
            efg_pct: adv("efg_pct"),
            ts_pct: adv("ts_pct"),
            pace: adv("pace"),
            turnover_pct: adv("tm_tov_pct"),
            off_rebound_pct: adv("oreb_pct"),
            def_rebound_pct: adv("dreb_pct"),
            free_throw_rate: adv("fta_rate").or_else(|| s.four_factors.get("fta_rate")),
            points_per_possession: adv("off_rating"),
            assist_pct: adv("ast_pct"),
            threepa_rate: fg3a / fga,
            paint_points_allowed: s
                .scoring
                .get("opp_pts_paint")
                .or_else(|| s.misc.get("opp_pts_paint")),
            rim_protection_pct: NotComputed,
            pick_and_roll_def_efficiency: NotComputed,
            starting_lineup_net_rating: NotComputed,
            bench_net_rating: NotComputed,
            home_away_splits: HomeAwaySplits {
                home_net_rating: s.home_split.get("net_rating"),
                away_net_rating: s.away_split.get("net_rating"),
            },
            clutch_net_rating: NotComputed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMetricsPair {
    pub home: TeamMetrics,
    pub away: TeamMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupFactors {
    pub pace_differential: f64,
    pub back_to_back_status: NotComputed,
    pub rest_advantage: NotComputed,
    pub travel_distance: NotComputed,
    pub time_zone_disadvantage: NotComputed,
    pub strength_of_schedule_last15: NotComputed,
    pub last10_net_rating_trend: f64,
    pub last3_momentum_shift: NotComputed,
    pub fatigue_index: f64,
    pub coaching_adjustments: NotComputed,
    pub zone_frequency: NotComputed,
    pub defensive_switch_efficiency: NotComputed,
    pub referee_foul_bias: NotComputed,
}

impl MatchupFactors {
    pub fn for_game(game: &Game, stats: &TeamStats) -> Self {
        let season_pace = |team: &str| {
            stats
                .get(team)
                .and_then(|r| r.advanced.get("pace"))
                .unwrap_or(DEFAULT_PACE)
        };
        let last10_net = |team: &str| {
            stats
                .get(team)
                .and_then(|r| r.advanced_last10.get("net_rating"))
                .unwrap_or(0.0)
        };
        let pace_differential = season_pace(game.home_team.as_str()) - season_pace(game.away_team.as_str());

        Self {
            pace_differential,
            back_to_back_status: NotComputed,
            rest_advantage: NotComputed,
            travel_distance: NotComputed,
            time_zone_disadvantage: NotComputed,
            strength_of_schedule_last15: NotComputed,
            last10_net_rating_trend: last10_net(game.home_team.as_str()) - last10_net(game.away_team.as_str()),
            last3_momentum_shift: NotComputed,
            fatigue_index: pace_differential.abs() * FATIGUE_PER_PACE,
            coaching_adjustments: NotComputed,
            zone_frequency: NotComputed,
            defensive_switch_efficiency: NotComputed,
            referee_foul_bias: NotComputed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerMetrics {
    pub team: String,
    pub status: String,
    pub usage_pct: NotComputed,
    pub per: NotComputed,
    pub bpm: NotComputed,
    pub vorp: NotComputed,
    pub on_off_net_rating: NotComputed,
    pub true_shooting_pct: NotComputed,
    pub win_shares: NotComputed,
    pub minutes_trend_last5: f64,
    pub injury_rotation_impact: NotComputed,
    pub pie: NotComputed,
    pub matchup_vs_defender: NotComputed,
    pub clutch_usage_pct: NotComputed,
}

impl From<&EligiblePlayer> for PlayerMetrics {
    fn from(p: &EligiblePlayer) -> Self {
        Self {
            team: p.team.clone(),
            status: p.status.clone(),
            usage_pct: NotComputed,
            per: NotComputed,
            bpm: NotComputed,
            vorp: NotComputed,
            on_off_net_rating: NotComputed,
            true_shooting_pct: NotComputed,
            win_shares: NotComputed,
            minutes_trend_last5: p.form.minutes_trend_last5,
            injury_rotation_impact: NotComputed,
            pie: NotComputed,
            matchup_vs_defender: NotComputed,
            clutch_usage_pct: NotComputed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvancedModelInputs {
    pub projected_possessions: f64,
    /// team code → last-10 offensive rating.
    pub projected_offensive_efficiency: BTreeMap<String, Option<f64>>,
    pub shot_quality_distribution: f64,
    pub player_fatigue_projection: f64,
    pub outcome_variance_model: f64,
    pub monte_carlo_simulations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BettingMarketData {
    pub opening_vs_current: NotComputed,
    pub reverse_line_movement: NotComputed,
    pub public_betting_pct: Option<serde_json::Value>,
    pub sharp_money_indicators: Option<serde_json::Value>,
    pub ats_trends: NotComputed,
    pub cover_pct_fav_dog: NotComputed,
    pub market_overreaction_signal: NotComputed,
}

impl From<&MarketSignals> for BettingMarketData {
    fn from(signals: &MarketSignals) -> Self {
        Self {
            opening_vs_current: NotComputed,
            reverse_line_movement: NotComputed,
            public_betting_pct: signals.public_pct.clone(),
            sharp_money_indicators: signals.sharp_indicators.clone(),
            ats_trends: NotComputed,
            cover_pct_fav_dog: NotComputed,
            market_overreaction_signal: NotComputed,
        }
    }
}

/// One entry of `game_analytics`.
///
/// Games stopped before pricing carry a `status` and only the team and
/// matchup blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameAnalytics {
    pub matchup: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GameStatus>,
    pub team_metrics: TeamMetricsPair,
    pub matchup_factors: MatchupFactors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_metrics_active_only: Option<BTreeMap<String, PlayerMetrics>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_model_inputs: Option<AdvancedModelInputs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub betting_market_data: Option<BettingMarketData>,
}

impl GameAnalytics {
    /// Team and matchup blocks only.
    pub fn base(game: &Game, stats: &TeamStats) -> Self {
        Self {
            matchup: game.label(),
            status: None,
            team_metrics: TeamMetricsPair {
                home: TeamMetrics::from_row(stats.get(&game.home_team)),
                away: TeamMetrics::from_row(stats.get(&game.away_team)),
            },
            matchup_factors: MatchupFactors::for_game(game, stats),
            player_metrics_active_only: None,
            advanced_model_inputs: None,
            betting_market_data: None,
        }
    }

    pub fn skipped(game: &Game, stats: &TeamStats, status: GameStatus) -> Self {
        Self { status: Some(status), ..Self::base(game, stats) }
    }

    /// Full entry for a game that reached pricing.
    pub fn priced(
        game: &Game,
        stats: &TeamStats,
        projection: &Projection,
        eligible: &[EligiblePlayer],
        signals: &MarketSignals,
        simulations: usize,
    ) -> Self {
        let base = Self::base(game, stats);
        let last10_off = |team: &str| stats.get(team).and_then(|r| r.advanced_last10.get("off_rating"));

        let efficiency = [&game.home_team, &game.away_team]
            .into_iter()
            .map(|t| (t.clone(), last10_off(t.as_str())))
            .collect();

        let inputs = AdvancedModelInputs {
            projected_possessions: projection.possessions,
            projected_offensive_efficiency: efficiency,
            shot_quality_distribution: projection.shot_quality,
            player_fatigue_projection: base.matchup_factors.fatigue_index,
            outcome_variance_model: MARGIN_SD * MARGIN_SD,
            monte_carlo_simulations: simulations,
        };

        Self {
            player_metrics_active_only: Some(
                eligible.iter().map(|p| (p.name.clone(), PlayerMetrics::from(p))).collect(),
            ),
            advanced_model_inputs: Some(inputs),
            betting_market_data: Some(BettingMarketData::from(signals)),
            ..base
        }
    }
}

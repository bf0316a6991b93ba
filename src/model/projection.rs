//! Matchup projection from team efficiency statistics.
//!
//! Possessions are the mean of both teams' pace; each side's efficiency
//! is its offensive rating blended with the opponent's defensive rating.
//! Last-10 values are preferred over season values throughout.

use serde::Serialize;

use crate::types::{TeamStatRow, TeamStats};

pub const DEFAULT_PACE: f64 = 99.0;
pub const DEFAULT_RATING: f64 = 112.0;
pub const DEFAULT_TS_PCT: f64 = 0.57;
/// Points added to the home side.
pub const HOME_COURT_PTS: f64 = 1.8;
/// Margin standard deviation.
pub const MARGIN_SD: f64 = 11.5;
/// Game-total standard deviation.
pub const TOTAL_SD: f64 = 16.5;
/// Single-team total standard deviation.
pub const TEAM_TOTAL_SD: f64 = 9.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    pub possessions: f64,
    pub home_pts: f64,
    pub away_pts: f64,
    /// Home minus away.
    pub spread_home: f64,
    pub total: f64,
    /// Mean true-shooting percentage of both sides.
    pub shot_quality: f64,
    pub outcome_variance: f64,
}

impl Projection {
    /// `HOME 114 - AWAY 109`
    pub fn score_line(&self, home: &str, away: &str) -> String {
        format!(
            "{home} {} - {away} {}",
            self.home_pts.round() as i64,
            self.away_pts.round() as i64
        )
    }
}

fn recent(row: Option<&TeamStatRow>, key: &str, default: f64) -> f64 {
    row.and_then(|r| r.recent_or_season(key)).unwrap_or(default)
}

pub fn project_game(home: &str, away: &str, stats: &TeamStats) -> Projection {
    let hs = stats.get(home);
    let av = stats.get(away);

    let possessions = (recent(hs, "pace", DEFAULT_PACE) + recent(av, "pace", DEFAULT_PACE)) / 2.0;

    let h_off = recent(hs, "off_rating", DEFAULT_RATING);
    let h_def = recent(hs, "def_rating", DEFAULT_RATING);
    let a_off = recent(av, "off_rating", DEFAULT_RATING);
    let a_def = recent(av, "def_rating", DEFAULT_RATING);

    let home_pts = possessions * (h_off + a_def) / 2.0 / 100.0 + HOME_COURT_PTS;
    let away_pts = possessions * (a_off + h_def) / 2.0 / 100.0;

    let ts = |row: Option<&TeamStatRow>| {
        row.and_then(|r| r.advanced.get("ts_pct")).unwrap_or(DEFAULT_TS_PCT)
    };

    Projection {
        possessions,
        home_pts,
        away_pts,
        spread_home: home_pts - away_pts,
        total: home_pts + away_pts,
        shot_quality: (ts(hs) + ts(av)) / 2.0,
        outcome_variance: MARGIN_SD * MARGIN_SD,
    }
}

//! Shared types for the report pipeline.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that source, model, strategy,
//! and report modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Three-letter team code ("BOS", "LAL", ...).
pub type TeamCode = String;

/// team code → player name → uppercased injury status.
pub type Injuries = BTreeMap<TeamCode, BTreeMap<String, String>>;

/// team code → projected starters (normalised names).
pub type Lineups = BTreeMap<TeamCode, Vec<String>>;

/// team code → merged statistics row.
pub type TeamStats = BTreeMap<TeamCode, TeamStatRow>;

/// team code → most recent completed game ids (newest first).
pub type RecentGames = BTreeMap<TeamCode, Vec<String>>;

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// A scheduled matchup on the target date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub home_team: TeamCode,
    pub away_team: TeamCode,
    /// Raw tip-off timestamp as published by the feed (ISO-8601, UTC).
    pub tipoff_utc: String,
}

impl Game {
    /// Key used to join schedule and odds feeds: `AWAY@HOME`.
    pub fn matchup_key(&self) -> String {
        matchup_key(&self.away_team, &self.home_team)
    }

    /// Human-readable label: `AWAY at HOME`.
    pub fn label(&self) -> String {
        format!("{} at {}", self.away_team, self.home_team)
    }

    /// Parsed tip-off time, if the feed value is a valid timestamp.
    pub fn tipoff(&self) -> Option<DateTime<Utc>> {
        parse_utc(&self.tipoff_utc)
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.id, self.label(), self.tipoff_utc)
    }
}

pub fn matchup_key(away: &str, home: &str) -> String {
    format!("{away}@{home}")
}

/// Parse an ISO-8601 timestamp, accepting a trailing `Z`.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// A feed payload together with the moment it was pulled.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub data: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> Fetched<T> {
    pub fn now(data: T) -> Self {
        Self { data, fetched_at: Utc::now() }
    }
}

// ---------------------------------------------------------------------------
// Team statistics
// ---------------------------------------------------------------------------

/// One statistic set for one team: lowercased column name → value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatSet(pub BTreeMap<String, f64>);

impl StatSet {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for StatSet {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        StatSet(iter.into_iter().collect())
    }
}

/// Merged per-team statistics, one named section per upstream query.
///
/// Sections are kept apart instead of flattened so that, say, the Base
/// `pts` and the Scoring `pts` can never overwrite each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamStatRow {
    pub advanced: StatSet,
    pub advanced_last10: StatSet,
    pub base: StatSet,
    pub four_factors: StatSet,
    pub scoring: StatSet,
    pub misc: StatSet,
    pub home_split: StatSet,
    pub away_split: StatSet,
}

impl TeamStatRow {
    /// Last-10 value when present, otherwise the season value.
    pub fn recent_or_season(&self, key: &str) -> Option<f64> {
        self.advanced_last10.get(key).or_else(|| self.advanced.get(key))
    }
}

// ---------------------------------------------------------------------------
// Player form
// ---------------------------------------------------------------------------

/// Recent-form summary for one player, derived from boxscores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerForm {
    pub games: usize,
    pub pts_mean: f64,
    pub reb_mean: f64,
    pub ast_mean: f64,
    pub threes_mean: f64,
    pub pra_mean: f64,
    pub pts_sd: f64,
    pub reb_sd: f64,
    pub ast_sd: f64,
    pub threes_sd: f64,
    pub pra_sd: f64,
    pub minutes_trend_last5: f64,
}

impl PlayerForm {
    /// Mean and standard deviation for a prop statistic.
    pub fn distribution(&self, stat: PropStat) -> (f64, f64) {
        match stat {
            PropStat::Points => (self.pts_mean, self.pts_sd),
            PropStat::Rebounds => (self.reb_mean, self.reb_sd),
            PropStat::Assists => (self.ast_mean, self.ast_sd),
            PropStat::Threes => (self.threes_mean, self.threes_sd),
            PropStat::Pra => (self.pra_mean, self.pra_sd),
        }
    }
}

// ---------------------------------------------------------------------------
// Odds provider structures
// ---------------------------------------------------------------------------

/// One matchup as published by the odds provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub commence_time: Option<String>,
    #[serde(default)]
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bookmaker {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub markets: Vec<Market>,
}

impl Bookmaker {
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            "Book"
        } else {
            &self.title
        }
    }
}

/// A single bet type offered by a bookmaker (`h2h`, `spreads`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Market {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Outcome {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// American odds.
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub point: Option<f64>,
}

impl Outcome {
    /// Quoted price; a missing price, or one that rounds to zero, is treated as -110.
    pub fn american_price(&self) -> i32 {
        match self.price.filter(|p| p.is_finite()).map(|p| p.round() as i32) {
            Some(p) if p != 0 => p,
            _ => -110,
        }
    }

    pub fn line(&self) -> f64 {
        self.point.filter(|p| p.is_finite()).unwrap_or(0.0)
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().map(str::trim).unwrap_or("")
    }

    pub fn is_over(&self) -> bool {
        self.name.eq_ignore_ascii_case("over")
    }
}

/// Market types the model prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketKind {
    Moneyline,
    Spread,
    Total,
    TeamTotal,
    PlayerProp(PropStat),
}

impl MarketKind {
    /// Map an odds-provider market key. Unknown keys are not priced.
    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "h2h" => MarketKind::Moneyline,
            "spreads" => MarketKind::Spread,
            "totals" => MarketKind::Total,
            "team_totals" => MarketKind::TeamTotal,
            "player_points" => MarketKind::PlayerProp(PropStat::Points),
            "player_rebounds" => MarketKind::PlayerProp(PropStat::Rebounds),
            "player_assists" => MarketKind::PlayerProp(PropStat::Assists),
            "player_threes" => MarketKind::PlayerProp(PropStat::Threes),
            "player_pra" => MarketKind::PlayerProp(PropStat::Pra),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropStat {
    Points,
    Rebounds,
    Assists,
    Threes,
    Pra,
}

impl fmt::Display for PropStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropStat::Points => write!(f, "Points"),
            PropStat::Rebounds => write!(f, "Rebounds"),
            PropStat::Assists => write!(f, "Assists"),
            PropStat::Threes => write!(f, "3PM"),
            PropStat::Pra => write!(f, "PRA"),
        }
    }
}

// ---------------------------------------------------------------------------
// Picks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

/// A qualifying +EV outcome. Probabilities are in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetPick {
    /// `AWAY at HOME`
    pub matchup: String,
    /// e.g. `Spread: Boston Celtics -4.5`
    pub market_type: String,
    /// e.g. `DraftKings (-110)`
    pub book_label: String,
    pub projected_probability: f64,
    pub implied_probability: f64,
    pub edge: f64,
    pub projected_score: Option<String>,
    pub reasons: Vec<String>,
    pub risk_level: RiskLevel,
    /// Stake in units, one decimal, 0 or within [1, 5].
    pub unit_size: Decimal,
}

impl fmt::Display for BetPick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} @ {} | model={:.1}% implied={:.1}% edge={:.1}% | {}u [{}]",
            self.matchup,
            self.market_type,
            self.book_label,
            self.projected_probability * 100.0,
            self.implied_probability * 100.0,
            self.edge * 100.0,
            self.unit_size,
            self.risk_level,
        )
    }
}

// ---------------------------------------------------------------------------
// Market sentiment
// ---------------------------------------------------------------------------

/// External public-money / sharp-money signal. Opaque passthrough values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSignals {
    pub public_pct: Option<serde_json::Value>,
    pub sharp_indicators: Option<serde_json::Value>,
    pub source: String,
}

impl MarketSignals {
    pub fn unavailable() -> Self {
        Self {
            public_pct: None,
            sharp_indicators: None,
            source: "unavailable".to_string(),
        }
    }
}

impl Default for MarketSignals {
    fn default() -> Self {
        Self::unavailable()
    }
}

// ---------------------------------------------------------------------------
// Sentinel
// ---------------------------------------------------------------------------

/// A metric this version of the model does not compute.
///
/// Serialized as the string `"unverified"`; never deserialized or
/// inspected by downstream logic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotComputed;

impl Serialize for NotComputed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("unverified")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> Game {
        Game {
            id: "0022500101".into(),
            home_team: "BOS".into(),
            away_team: "NYK".into(),
            tipoff_utc: "2026-10-19T23:30:00Z".into(),
        }
    }

    #[test]
    fn test_game_keys() {
        let g = game();
        assert_eq!(g.matchup_key(), "NYK@BOS");
        assert_eq!(g.label(), "NYK at BOS");
        assert!(g.tipoff().is_some());
    }

    #[test]
    fn test_unparseable_tipoff() {
        let mut g = game();
        g.tipoff_utc = "TBD".into();
        assert!(g.tipoff().is_none());
    }

    #[test]
    fn test_recent_or_season_prefers_last10() {
        let mut row = TeamStatRow::default();
        row.advanced.insert("pace", 98.0);
        assert_eq!(row.recent_or_season("pace"), Some(98.0));
        row.advanced_last10.insert("pace", 101.5);
        assert_eq!(row.recent_or_season("pace"), Some(101.5));
        assert_eq!(row.recent_or_season("missing"), None);
    }

    #[test]
    fn test_outcome_defaults() {
        let o: Outcome = serde_json::from_str(r#"{"name": "Over"}"#).unwrap();
        assert_eq!(o.american_price(), -110);
        assert_eq!(o.line(), 0.0);
        assert!(o.is_over());

        let o: Outcome = serde_json::from_str(r#"{"name": "X", "price": 145, "point": -3.5}"#).unwrap();
        assert_eq!(o.american_price(), 145);
        assert_eq!(o.line(), -3.5);
    }

    #[test]
    fn test_price_rounding_to_zero_uses_default() {
        for raw in ["0.4", "-0.4", "0"] {
            let o: Outcome = serde_json::from_str(&format!(r#"{{"name": "Over", "price": {raw}}}"#)).unwrap();
            assert_eq!(o.american_price(), -110, "price {raw}");
            let p = crate::strategy::edge::implied_probability(o.american_price());
            assert!(p > 0.0 && p < 1.0);
        }
        let o: Outcome = serde_json::from_str(r#"{"name": "Over", "price": 0.6}"#).unwrap();
        assert_eq!(o.american_price(), 1);
    }

    #[test]
    fn test_market_kind_from_key() {
        assert_eq!(MarketKind::from_key("h2h"), Some(MarketKind::Moneyline));
        assert_eq!(
            MarketKind::from_key("player_pra"),
            Some(MarketKind::PlayerProp(PropStat::Pra))
        );
        assert_eq!(MarketKind::from_key("player_blocks"), None);
    }

    #[test]
    fn test_not_computed_serializes_as_unverified() {
        let json = serde_json::to_string(&NotComputed).unwrap();
        assert_eq!(json, "\"unverified\"");
    }

    #[test]
    fn test_bookmaker_label_fallback() {
        let b = Bookmaker::default();
        assert_eq!(b.label(), "Book");
    }
}

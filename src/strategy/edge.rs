//! Market pricing and edge detection.
//!
//! Every outcome of every bookmaker market for a matchup is priced against
//! the model and compared to the probability implied by its American odds.
//! Outcomes clearing `MIN_EDGE` become candidate picks.

use tracing::debug;

use super::kelly::unit_size;
use crate::model::projection::TEAM_TOTAL_SD;
use crate::model::{prob_over_normal, Projection, Simulator};
use crate::sources::odds::team_code;
use crate::types::{
    BetPick, Bookmaker, Game, Market, MarketEvent, MarketKind, PlayerForm, PropStat, RiskLevel,
};

/// Minimum model-minus-market edge for a pick.
pub const MIN_EDGE: f64 = 0.03;
/// Moneyline prices beyond this (either sign) are high risk.
pub const HIGH_RISK_PRICE: i32 = 170;
/// Floor for player-prop standard deviation.
pub const PROP_SD_FLOOR: f64 = 1.0;

/// Market-implied probability of American odds.
pub fn implied_probability(odds: i32) -> f64 {
    let o = f64::from(odds);
    if odds < 0 {
        -o / (-o + 100.0)
    } else {
        100.0 / (o + 100.0)
    }
}

pub fn reasons_for(kind: MarketKind) -> &'static [&'static str] {
    match kind {
        MarketKind::Spread => &[
            "Projected margin differs materially from market spread",
            "Recent pace/off-def blend supports cover probability",
            "Eligible active-player filter satisfied",
        ],
        MarketKind::Total => &[
            "Projected possessions and efficiency imply total mispricing",
            "Model variance profile still clears 3% edge threshold",
            "Fresh same-day inputs used",
        ],
        MarketKind::Moneyline => &[
            "Win-probability simulation exceeds implied probability",
            "Last-10 net-rating differential supports side",
            "Home-court and efficiency adjustment included",
        ],
        MarketKind::TeamTotal => &[
            "Team-scoring projection diverges from posted team total",
            "Opponent defensive rating embedded in mean projection",
            "Distribution model keeps edge above cutoff",
        ],
        MarketKind::PlayerProp(_) => &[
            "Last-game form mean/variance projects mispriced prop",
            "Only active eligible players included",
            "Edge remains above 3% after variance adjustment",
        ],
    }
}

pub fn risk_for(kind: MarketKind, price: i32) -> RiskLevel {
    match kind {
        MarketKind::PlayerProp(_) => RiskLevel::High,
        MarketKind::Moneyline if price.abs() > HIGH_RISK_PRICE => RiskLevel::High,
        _ => RiskLevel::Medium,
    }
}

/// `215.5`, `3.0`
fn fmt_line(line: f64) -> String {
    if line.fract() == 0.0 {
        format!("{line:.1}")
    } else {
        format!("{line}")
    }
}

/// `+3.5`, `-4.0`
fn fmt_signed_line(line: f64) -> String {
    if line >= 0.0 {
        format!("+{}", fmt_line(line))
    } else {
        fmt_line(line)
    }
}

// ---------------------------------------------------------------------------
// Pricing context
// ---------------------------------------------------------------------------

/// A player who passed the injury and recent-activity filters.
#[derive(Debug, Clone)]
pub struct EligiblePlayer {
    pub team: String,
    pub name: String,
    pub status: String,
    pub form: PlayerForm,
}

/// Everything needed to price one matchup's markets.
pub struct GamePricing<'a> {
    pub game: &'a Game,
    pub event: &'a MarketEvent,
    pub projection: Projection,
    pub eligible: &'a [EligiblePlayer],
}

impl GamePricing<'_> {
    /// All qualifying picks across the event's bookmakers, in feed order.
    pub fn find_picks(&self, sim: &mut Simulator) -> Vec<BetPick> {
        let mut picks = Vec::new();
        for book in &self.event.bookmakers {
            for market in &book.markets {
                let Some(kind) = MarketKind::from_key(&market.key) else {
                    continue;
                };
                self.price_market(sim, book, market, kind, &mut picks);
            }
        }
        picks
    }

    fn price_market(
        &self,
        sim: &mut Simulator,
        book: &Bookmaker,
        market: &Market,
        kind: MarketKind,
        picks: &mut Vec<BetPick>,
    ) {
        let p = &self.projection;
        let score = Some(p.score_line(&self.game.home_team, &self.game.away_team));

        for out in &market.outcomes {
            let price = out.american_price();
            let line = out.line();

            let priced = match kind {
                MarketKind::Spread => {
                    let margin = self.side_margin(&out.name);
                    let prob = sim.spread_probability(margin, line);
                    Some((prob, format!("Spread: {} {}", out.name, fmt_signed_line(line)), score.clone()))
                }
                MarketKind::Moneyline => {
                    let margin = self.side_margin(&out.name);
                    let prob = sim.spread_probability(margin, 0.0);
                    Some((prob, format!("Moneyline: {}", out.name), score.clone()))
                }
                MarketKind::Total => {
                    let prob = sim.total_probability(p.total, line, out.is_over());
                    Some((prob, format!("Game Total: {} {}", out.name, fmt_line(line)), score.clone()))
                }
                MarketKind::TeamTotal => self.team_total(out.description(), line, out.is_over()).map(|(team, prob)| {
                    (prob, format!("Team Total: {team} {} {}", out.name, fmt_line(line)), score.clone())
                }),
                MarketKind::PlayerProp(stat) => self.player_prop(out.description(), stat, line, out.is_over()).map(|prob| {
                    (
                        prob,
                        format!("Player Prop: {} {stat} {} {}", out.description(), out.name, fmt_line(line)),
                        None,
                    )
                }),
            };

            let Some((prob, market_type, projected_score)) = priced else {
                continue;
            };
            if let Some(pick) = self.qualify(book, kind, price, prob, market_type, projected_score) {
                picks.push(pick);
            }
        }
    }

    /// Projected margin from the named side's perspective.
    fn side_margin(&self, outcome_name: &str) -> f64 {
        if outcome_name.eq_ignore_ascii_case(&self.event.home_team) {
            self.projection.spread_home
        } else {
            -self.projection.spread_home
        }
    }

    fn team_total(&self, team_name: &str, line: f64, over: bool) -> Option<(&'static str, f64)> {
        let code = team_code(team_name)?;
        let mean = if code == self.game.home_team {
            self.projection.home_pts
        } else if code == self.game.away_team {
            self.projection.away_pts
        } else {
            return None;
        };
        let p_over = prob_over_normal(mean, TEAM_TOTAL_SD, line);
        Some((code, if over { p_over } else { 1.0 - p_over }))
    }

    fn player_prop(&self, player: &str, stat: PropStat, line: f64, over: bool) -> Option<f64> {
        let eligible = self.eligible.iter().find(|e| e.name == player)?;
        let (mean, sd) = eligible.form.distribution(stat);
        let p_over = prob_over_normal(mean, sd.max(PROP_SD_FLOOR), line);
        Some(if over { p_over } else { 1.0 - p_over })
    }

    fn qualify(
        &self,
        book: &Bookmaker,
        kind: MarketKind,
        price: i32,
        projected: f64,
        market_type: String,
        projected_score: Option<String>,
    ) -> Option<BetPick> {
        let implied = implied_probability(price);
        let edge = projected - implied;
        if edge < MIN_EDGE {
            return None;
        }

        debug!(
            matchup = %self.game.label(),
            market = %market_type,
            edge = format!("{:.1}%", edge * 100.0),
            "Edge found"
        );

        Some(BetPick {
            matchup: self.game.label(),
            market_type,
            book_label: format!("{} ({price})", book.label()),
            projected_probability: projected,
            implied_probability: implied,
            edge,
            projected_score,
            reasons: reasons_for(kind).iter().map(|r| r.to_string()).collect(),
            risk_level: risk_for(kind, price),
            unit_size: unit_size(edge),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

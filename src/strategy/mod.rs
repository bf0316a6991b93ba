//! Strategy engine: market pricing, stake sizing and pick selection.

pub mod edge;
pub mod kelly;

use serde::Serialize;
use tracing::info;

use crate::types::BetPick;

/// Maximum number of ranked picks in a report.
pub const MAX_PICKS: usize = 10;

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

/// Higher-payout variant of a ranked pick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AltLine {
    pub play: String,
    pub target_odds: String,
    pub reason: String,
}

/// Two-leg parlay built on a shared pace/efficiency driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parlay {
    pub legs: Vec<String>,
    /// Shared matchup label, or `cross-game`.
    pub matchup: String,
    pub justification: String,
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Sort by descending edge and keep the best `MAX_PICKS`. No padding.
pub fn rank_picks(mut picks: Vec<BetPick>) -> Vec<BetPick> {
    let candidates = picks.len();
    picks.sort_by(|a, b| b.edge.total_cmp(&a.edge));
    picks.truncate(MAX_PICKS);
    info!(candidates, ranked = picks.len(), "Picks ranked");
    picks
}

/// Alternate-line ideas for the top one or two picks.
pub fn alt_lines(ranked: &[BetPick]) -> Vec<AltLine> {
    const PROFILES: [(&str, &str); 2] = [
        (
            "+110 to +220",
            "Tail simulation still shows positive EV under a more aggressive payout profile.",
        ),
        (
            "+130 to +350",
            "Distribution skew supports a smaller-probability/high-payout variant.",
        ),
    ];

    ranked
        .iter()
        .zip(PROFILES)
        .map(|(pick, (target_odds, reason))| AltLine {
            play: format!("{} alternate line aligned with {}", pick.matchup, pick.market_type),
            target_odds: target_odds.to_string(),
            reason: reason.to_string(),
        })
        .collect()
}

/// Pair the top pick with the next pick from the same matchup, or with the
/// second-ranked pick when its matchup has no other pick.
pub fn correlated_parlay(ranked: &[BetPick]) -> Option<Parlay> {
    let (first, rest) = ranked.split_first()?;
    let fallback = rest.first()?;
    let second = rest
        .iter()
        .find(|p| p.matchup == first.matchup)
        .unwrap_or(fallback);

    let matchup = if second.matchup == first.matchup {
        first.matchup.clone()
    } else {
        "cross-game".to_string()
    };

    Some(Parlay {
        legs: vec![first.market_type.clone(), second.market_type.clone()],
        matchup,
        justification: "Selected legs have a shared statistical driver (pace/efficiency path), \
                        improving correlation-adjusted EV."
            .to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

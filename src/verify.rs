//! Freshness and cross-feed consistency checks.
//!
//! Advisory only: issues mark the run as degraded but never stop it.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use tracing::warn;

use crate::sources::odds::events_by_matchup;
use crate::types::{parse_utc, Game, Injuries, Lineups, MarketEvent};

/// Inputs to the verifier, borrowed from the run.
#[derive(Debug)]
pub struct FeedSnapshot<'a> {
    pub games: &'a [Game],
    pub injuries: &'a Injuries,
    pub lineups: &'a Lineups,
    pub odds: &'a [MarketEvent],
    /// Feed label → fetch time.
    pub fetched_at: BTreeMap<&'static str, DateTime<Utc>>,
}

/// Outcome of a verification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub issues: Vec<String>,
}

impl Verification {
    pub fn ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check presence, same-day freshness and schedule/odds agreement.
///
/// `run_date` is the report date; `now` is the wall clock used for the
/// "fetched today" check.
pub fn verify_feeds(snapshot: &FeedSnapshot<'_>, run_date: NaiveDate, now: DateTime<Utc>) -> Verification {
    let mut issues = Vec::new();

    if snapshot.games.is_empty() {
        issues.push("No confirmed schedule games for TODAY.".to_string());
    }
    if snapshot.injuries.is_empty() {
        issues.push("Injury feed empty.".to_string());
    }
    if snapshot.lineups.is_empty() {
        issues.push("Projected lineup feed empty.".to_string());
    }
    if snapshot.odds.is_empty() {
        issues.push("Betting market feed empty.".to_string());
    }

    let today = now.date_naive();
    for (feed, ts) in &snapshot.fetched_at {
        if ts.date_naive() != today {
            issues.push(format!("{feed} not fetched today."));
        }
    }

    let by_matchup = events_by_matchup(snapshot.odds);
    for game in snapshot.games {
        let key = game.matchup_key();
        let Some(event) = by_matchup.get(&key) else {
            issues.push(format!("Missing odds for {key}."));
            continue;
        };
        match event.commence_time.as_deref().filter(|s| !s.is_empty()) {
            None => issues.push(format!("Missing commence_time for {key}.")),
            Some(raw) => match parse_utc(raw) {
                Some(t) if t.date_naive() != run_date => {
                    issues.push(format!("Schedule/odds date mismatch for {key}."))
                }
                Some(_) => {}
                None => issues.push(format!("Unparseable commence_time for {key}.")),
            },
        }
    }

    for issue in &issues {
        warn!(issue = %issue, "Verification issue");
    }
    Verification { issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 15, 0, 0).unwrap()
    }

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn game() -> Game {
        Game {
            id: "g1".into(),
            home_team: "BOS".into(),
            away_team: "NYK".into(),
            tipoff_utc: "2026-10-19T23:30:00Z".into(),
        }
    }

    fn event(commence: Option<&str>) -> MarketEvent {
        MarketEvent {
            id: "e1".into(),
            commence_time: commence.map(str::to_string),
            home_team: "Boston Celtics".into(),
            away_team: "New York Knicks".into(),
            bookmakers: vec![],
        }
    }

    fn feeds() -> (Injuries, Lineups) {
        let mut injuries = Injuries::new();
        injuries.entry("BOS".into()).or_default().insert("X Y".into(), "OUT".into());
        let mut lineups = Lineups::new();
        lineups.insert("BOS".into(), vec!["A B".into()]);
        (injuries, lineups)
    }

    fn stamps(ts: DateTime<Utc>) -> BTreeMap<&'static str, DateTime<Utc>> {
        ["schedule", "injuries", "lineups", "odds"]
            .into_iter()
            .map(|k| (k, ts))
            .collect()
    }

    #[test]
    fn test_clean_snapshot_passes() {
        let (injuries, lineups) = feeds();
        let games = [game()];
        let odds = [event(Some("2026-10-19T23:30:00Z"))];
        let snap = FeedSnapshot {
            games: &games,
            injuries: &injuries,
            lineups: &lineups,
            odds: &odds,
            fetched_at: stamps(now()),
        };
        let v = verify_feeds(&snap, run_date(), now());
        assert!(v.ok(), "{:?}", v.issues);
    }

    #[test]
    fn test_empty_feeds_each_reported() {
        let injuries = Injuries::new();
        let lineups = Lineups::new();
        let snap = FeedSnapshot {
            games: &[],
            injuries: &injuries,
            lineups: &lineups,
            odds: &[],
            fetched_at: BTreeMap::new(),
        };
        let v = verify_feeds(&snap, run_date(), now());
        assert_eq!(
            v.issues,
            vec![
                "No confirmed schedule games for TODAY.",
                "Injury feed empty.",
                "Projected lineup feed empty.",
                "Betting market feed empty.",
            ]
        );
    }

    #[test]
    fn test_stale_fetch_flagged() {
        let (injuries, lineups) = feeds();
        let games = [game()];
        let odds = [event(Some("2026-10-19T23:30:00Z"))];
        let mut fetched_at = stamps(now());
        fetched_at.insert("odds", Utc.with_ymd_and_hms(2026, 10, 18, 23, 0, 0).unwrap());
        let snap = FeedSnapshot {
            games: &games,
            injuries: &injuries,
            lineups: &lineups,
            odds: &odds,
            fetched_at,
        };
        let v = verify_feeds(&snap, run_date(), now());
        assert_eq!(v.issues, vec!["odds not fetched today."]);
    }

    #[test]
    fn test_commence_time_problems() {
        let (injuries, lineups) = feeds();
        let games = [game()];
        let cases = [
            (None, "Missing commence_time for NYK@BOS."),
            (Some("2026-10-20T00:30:00Z"), "Schedule/odds date mismatch for NYK@BOS."),
            (Some("tonight"), "Unparseable commence_time for NYK@BOS."),
        ];
        for (commence, expected) in cases {
            let odds = [event(commence)];
            let snap = FeedSnapshot {
                games: &games,
                injuries: &injuries,
                lineups: &lineups,
                odds: &odds,
                fetched_at: stamps(now()),
            };
            let v = verify_feeds(&snap, run_date(), now());
            assert_eq!(v.issues, vec![expected.to_string()]);
        }
    }

    #[test]
    fn test_missing_event_for_game() {
        let (injuries, lineups) = feeds();
        let mut other = game();
        other.away_team = "MIA".into();
        let games = [other];
        let odds = [event(Some("2026-10-19T23:30:00Z"))];
        let snap = FeedSnapshot {
            games: &games,
            injuries: &injuries,
            lineups: &lineups,
            odds: &odds,
            fetched_at: stamps(now()),
        };
        let v = verify_feeds(&snap, run_date(), now());
        assert_eq!(v.issues, vec!["Missing odds for MIA@BOS."]);
    }
}

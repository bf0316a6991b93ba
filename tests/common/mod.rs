//! Scripted upstream for integration testing.
//!
//! Provides a deterministic `HttpTransport` that answers each request from
//! a table of URL fragments, plus fixture payloads for one BOS/NYK slate.
//! Everything is in-memory; unknown URLs answer 404.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use quant_edge::upstream::{FetchRequest, HttpResponse, HttpTransport};

pub struct ScriptedTransport {
    /// URL fragment → (status, body). First match wins.
    routes: Vec<(String, u16, String)>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn route(mut self, fragment: &str, status: u16, body: impl Into<String>) -> Self {
        self.routes.push((fragment.to_string(), status, body.into()));
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// A full slate: one scheduled game and three completed meetings.
    pub fn full_slate(date: NaiveDate) -> Self {
        Self::new()
            .route("schedule.json", 200, schedule(date).to_string())
            .route("/injuries", 200, injuries().to_string())
            .route("nba-lineups.php", 200, lineups_html())
            .route("leaguedashteamstats", 200, team_stats().to_string())
            .route("/boxscore_", 200, boxscore().to_string())
            .route("the-odds-api.com", 200, odds(date).to_string())
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, request: &FetchRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.url.clone());
        let hit = self
            .routes
            .iter()
            .find(|(fragment, _, _)| request.url.contains(fragment.as_str()));
        Ok(match hit {
            Some((_, status, body)) => HttpResponse {
                status: *status,
                body: body.clone(),
            },
            None => HttpResponse {
                status: 404,
                body: String::new(),
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub const HOME: [&str; 5] = [
    "Jayson Tatum",
    "Jaylen Brown",
    "Derrick White",
    "Jrue Holiday",
    "Kristaps Porzingis",
];

pub const AWAY: [&str; 5] = [
    "Jalen Brunson",
    "Mikal Bridges",
    "Josh Hart",
    "OG Anunoby",
    "Karl-Anthony Towns",
];

pub fn ymd(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub fn schedule(date: NaiveDate) -> Value {
    let past = |days: i64, id: &str| {
        let day = date - chrono::Duration::days(days);
        json!({
            "gameId": id,
            "startDateEastern": ymd(day),
            "startTimeUTC": format!("{}T23:30:00Z", day.format("%Y-%m-%d")),
            "statusNum": 3,
            "hTeam": {"triCode": "BOS"},
            "vTeam": {"triCode": "NYK"}
        })
    };
    json!({"league": {"standard": [
        past(6, "0022600001"),
        past(4, "0022600002"),
        past(2, "0022600003"),
        {
            "gameId": "0022600010",
            "startDateEastern": ymd(date),
            "startTimeUTC": format!("{}T23:30:00Z", date.format("%Y-%m-%d")),
            "statusNum": 1,
            "hTeam": {"triCode": "BOS"},
            "vTeam": {"triCode": "NYK"}
        }
    ]}})
}

pub fn injuries() -> Value {
    json!({"injuries": [
        {"team": {"abbreviation": "BOS"}, "injuries": [
            {"athlete": {"displayName": "Jaylen Brown"}, "status": "Out"},
            {"athlete": {"displayName": "Derrick White"}, "status": "Day-To-Day"}
        ]}
    ]})
}

/// One card: away starters first, then home.
pub fn lineups_html() -> String {
    let items: String = AWAY
        .iter()
        .chain(HOME.iter())
        .map(|name| {
            let short = format!("{}. {}", &name[..1], name.split_whitespace().last().unwrap_or(name));
            format!("<li class=\"lineup__player\"><div>F</div><a title=\"{name}\">{short}</a></li>")
        })
        .collect();
    format!(
        "<html><body><div class=\"lineup is-nba\">\
           <div class=\"lineup__abbr\">NYK</div><div class=\"lineup__abbr\">BOS</div>\
           <ul>{items}</ul>\
         </div></body></html>"
    )
}

/// Identical league rows for both teams, served for every stats query.
pub fn team_stats() -> Value {
    let headers = ["TEAM_ID", "TEAM_ABBREVIATION", "PACE", "OFF_RATING", "DEF_RATING", "TS_PCT", "FGA", "FG3A"];
    json!({"resultSets": [{
        "name": "LeagueDashTeamStats",
        "headers": headers,
        "rowSet": [
            [1610612738, "BOS", 99.0, 115.0, 110.0, 0.58, 88.0, 42.0],
            [1610612752, "NYK", 99.0, 115.0, 110.0, 0.58, 88.0, 42.0]
        ]
    }]})
}

/// Same box score for every completed game; Tatum scores 28-32.
pub fn boxscore() -> Value {
    let player = |name: &str, pts: f64| {
        let (first, family) = name.split_once(' ').unwrap_or((name, ""));
        json!({
            "firstName": first,
            "familyName": family,
            "statistics": {
                "points": pts,
                "reboundsTotal": 6.0,
                "assists": 4.0,
                "threePointersMade": 2.0,
                "minutes": "PT34M12.00S"
            }
        })
    };
    let home: Vec<Value> = HOME
        .iter()
        .map(|n| player(n, if *n == "Jayson Tatum" { 30.0 } else { 14.0 }))
        .collect();
    let away: Vec<Value> = AWAY.iter().map(|n| player(n, 16.0)).collect();
    json!({"game": {"homeTeam": {"players": home}, "awayTeam": {"players": away}}})
}

pub fn odds(date: NaiveDate) -> Value {
    json!([{
        "id": "evt-1",
        "commence_time": format!("{}T23:30:00Z", date.format("%Y-%m-%d")),
        "home_team": "Boston Celtics",
        "away_team": "New York Knicks",
        "bookmakers": [{
            "key": "draftkings",
            "title": "DraftKings",
            "markets": [
                {"key": "h2h", "outcomes": [
                    {"name": "Boston Celtics", "price": 150},
                    {"name": "New York Knicks", "price": -200}
                ]},
                {"key": "player_points", "outcomes": [
                    {"name": "Over", "description": "Jayson Tatum", "price": -110, "point": 19.5},
                    {"name": "Under", "description": "Jayson Tatum", "price": -110, "point": 19.5},
                    {"name": "Over", "description": "Jaylen Brown", "price": -110, "point": 5.5}
                ]}
            ]
        }]
    }])
}

//! League injury report.

use serde::Deserialize;

use super::{decode_records, DataClient};
use crate::types::{Fetched, Injuries};
use crate::upstream::{FetchError, FetchRequest};

const SOURCE: &str = "injuries.espn";

#[derive(Debug, Deserialize, Default)]
struct InjuryFeed {
    #[serde(default)]
    injuries: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
struct TeamBlock {
    #[serde(default)]
    team: TeamRef,
    #[serde(default)]
    injuries: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
struct TeamRef {
    #[serde(default)]
    abbreviation: String,
}

#[derive(Debug, Deserialize, Default)]
struct InjuryEntry {
    #[serde(default)]
    athlete: Athlete,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Athlete {
    #[serde(default)]
    display_name: String,
}

/// Group by team abbreviation → player → uppercased status.
pub fn parse_injuries(payload: &serde_json::Value) -> Result<Injuries, serde_json::Error> {
    let feed = InjuryFeed::deserialize(payload)?;
    let mut out = Injuries::new();

    for block in decode_records::<TeamBlock>(SOURCE, feed.injuries) {
        if block.team.abbreviation.is_empty() {
            continue;
        }
        let team = out.entry(block.team.abbreviation).or_default();
        for entry in decode_records::<InjuryEntry>(SOURCE, block.injuries) {
            let name = entry.athlete.display_name.trim();
            if !name.is_empty() {
                team.insert(name.to_string(), entry.status.trim().to_uppercase());
            }
        }
    }
    Ok(out)
}

impl DataClient {
    pub async fn fetch_injuries(&mut self) -> Result<Fetched<Injuries>, FetchError> {
        let payload = self
            .upstream
            .get_json(SOURCE, &FetchRequest::new(&self.endpoints.injuries))
            .await?;
        let injuries = parse_injuries(&payload).map_err(|e| FetchError::Malformed {
            source_id: SOURCE.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Fetched::now(injuries))
    }
}

//! Projected starting lineups scraped from the lineups page.
//!
//! A matchup card is accepted only when it exposes two team labels and at
//! least ten players; the first five are the away starters, the next five
//! the home starters.

use scraper::{Html, Selector};
use tracing::debug;

use super::DataClient;
use crate::types::{Fetched, Lineups};
use crate::upstream::{FetchError, FetchRequest};

const SOURCE: &str = "lineups.rotowire";
const STARTERS: usize = 5;

const CARD_SELECTOR: &str = "div.lineup.is-nba";
const TEAM_SELECTOR: &str = "div.lineup__abbr";
const PLAYER_SELECTOR: &str = "li.lineup__player";
/// Player links carry the full name in `title`; the text is often abbreviated.
const PLAYER_LINK_SELECTOR: &str = "a[title]";

/// Keep the first two whitespace-separated tokens of a listed name.
pub fn normalize_player_name(raw: &str) -> String {
    raw.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Malformed {
        source_id: SOURCE.to_string(),
        reason: format!("bad selector {css}: {e}"),
    })
}

/// Extract lineups from the page markup.
pub fn parse_lineups(html: &str) -> Result<Lineups, FetchError> {
    let card_sel = selector(CARD_SELECTOR)?;
    let team_sel = selector(TEAM_SELECTOR)?;
    let player_sel = selector(PLAYER_SELECTOR)?;
    let link_sel = selector(PLAYER_LINK_SELECTOR)?;

    let document = Html::parse_document(html);
    let mut lineups = Lineups::new();

    for card in document.select(&card_sel) {
        let teams: Vec<String> = card
            .select(&team_sel)
            .map(|t| t.text().collect::<String>().trim().to_string())
            .collect();
        let players: Vec<String> = card
            .select(&player_sel)
            .map(|p| {
                let listed = p
                    .select(&link_sel)
                    .next()
                    .and_then(|a| a.value().attr("title"))
                    .map(str::to_string)
                    .unwrap_or_else(|| p.text().collect::<Vec<_>>().join(" "));
                normalize_player_name(&listed)
            })
            .collect();

        if teams.len() < 2 || players.len() < STARTERS * 2 {
            debug!(teams = teams.len(), players = players.len(), "Skipping incomplete lineup card");
            continue;
        }

        lineups.insert(teams[0].clone(), players[..STARTERS].to_vec());
        lineups.insert(teams[1].clone(), players[STARTERS..STARTERS * 2].to_vec());
    }

    Ok(lineups)
}

impl DataClient {
    pub async fn fetch_lineups(&mut self) -> Result<Fetched<Lineups>, FetchError> {
        let html = self
            .upstream
            .get_text(SOURCE, &FetchRequest::new(&self.endpoints.lineups))
            .await?;
        // Parsed synchronously; the DOM is not Send and must not cross an await.
        let lineups = parse_lineups(&html)?;
        Ok(Fetched::now(lineups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(away: &str, home: &str, players: &[&str]) -> String {
        let items: String = players
            .iter()
            .map(|p| format!("<li class=\"lineup__player\"><a>{p}</a></li>"))
            .collect();
        format!(
            "<div class=\"lineup is-nba\">\
               <div class=\"lineup__abbr\">{away}</div><div class=\"lineup__abbr\">{home}</div>\
               <ul>{items}</ul>\
             </div>"
        )
    }

    #[test]
    fn test_normalize_player_name() {
        assert_eq!(normalize_player_name("  Jalen   Brunson  Jr. "), "Jalen Brunson");
        assert_eq!(normalize_player_name("Nene"), "Nene");
        assert_eq!(normalize_player_name(""), "");
    }

    #[test]
    fn test_parse_full_card_splits_away_then_home() {
        let names: Vec<String> = (0..10).map(|i| format!("Player{i} Last{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let html = format!("<html><body>{}</body></html>", card("NYK", "BOS", &refs));

        let lineups = parse_lineups(&html).unwrap();
        assert_eq!(lineups.len(), 2);
        assert_eq!(lineups["NYK"].len(), 5);
        assert_eq!(lineups["BOS"].len(), 5);
        assert_eq!(lineups["NYK"][0], "Player0 Last0");
        assert_eq!(lineups["BOS"][4], "Player9 Last9");
    }

    #[test]
    fn test_link_title_preferred_over_abbreviated_text() {
        let mut items = String::from(
            "<li class=\"lineup__player\"><div>PG</div><a title=\"Jalen Brunson\">J. Brunson</a></li>",
        );
        for i in 1..10 {
            items.push_str(&format!("<li class=\"lineup__player\"><a>P{i} X</a></li>"));
        }
        let html = format!(
            "<div class=\"lineup is-nba\"><div class=\"lineup__abbr\">NYK</div>\
             <div class=\"lineup__abbr\">BOS</div><ul>{items}</ul></div>"
        );
        let lineups = parse_lineups(&html).unwrap();
        assert_eq!(lineups["NYK"][0], "Jalen Brunson");
    }

    #[test]
    fn test_incomplete_card_rejected() {
        let refs = ["A B", "C D", "E F"];
        let html = format!("<html><body>{}</body></html>", card("NYK", "BOS", &refs));
        let lineups = parse_lineups(&html).unwrap();
        assert!(lineups.is_empty());
    }

    #[test]
    fn test_no_cards() {
        assert!(parse_lineups("<html></html>").unwrap().is_empty());
    }
}

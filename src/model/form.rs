//! Recent-form summaries built from per-game player lines.

use crate::types::PlayerForm;

/// Default and floor for each sample standard deviation.
pub const PTS_SD_FLOOR: f64 = 4.5;
pub const REB_SD_FLOOR: f64 = 2.5;
pub const AST_SD_FLOOR: f64 = 2.0;
pub const THREES_SD_FLOOR: f64 = 1.2;
pub const PRA_SD_FLOOR: f64 = 6.0;

/// One player's box line for one game.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GameLine {
    pub minutes: f64,
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub threes: f64,
}

impl GameLine {
    pub fn pra(&self) -> f64 {
        self.points + self.rebounds + self.assists
    }
}

fn mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        0.0
    } else {
        vals.iter().sum::<f64>() / vals.len() as f64
    }
}

/// Sample standard deviation, floored at `floor`. Fewer than two values → `floor`.
fn sample_sd(vals: &[f64], floor: f64) -> f64 {
    if vals.len() < 2 {
        return floor;
    }
    let m = mean(vals);
    let var = vals.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (vals.len() - 1) as f64;
    var.sqrt().max(floor)
}

/// Summarize the games a player actually appeared in.
pub fn summarize_form(lines: &[GameLine]) -> PlayerForm {
    let col = |f: fn(&GameLine) -> f64| lines.iter().map(f).collect::<Vec<_>>();
    let pts = col(|l| l.points);
    let reb = col(|l| l.rebounds);
    let ast = col(|l| l.assists);
    let threes = col(|l| l.threes);
    let pra = col(GameLine::pra);
    let mins = col(|l| l.minutes);

    PlayerForm {
        games: lines.len(),
        pts_mean: mean(&pts),
        reb_mean: mean(&reb),
        ast_mean: mean(&ast),
        threes_mean: mean(&threes),
        pra_mean: mean(&pra),
        pts_sd: sample_sd(&pts, PTS_SD_FLOOR),
        reb_sd: sample_sd(&reb, REB_SD_FLOOR),
        ast_sd: sample_sd(&ast, AST_SD_FLOOR),
        threes_sd: sample_sd(&threes, THREES_SD_FLOOR),
        pra_sd: sample_sd(&pra, PRA_SD_FLOOR),
        minutes_trend_last5: mean(&mins),
    }
}

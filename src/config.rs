//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`. Every section has defaults,
//! so a partial (or empty) file is valid.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

/// Floor on the Monte Carlo sample count, whatever the config says.
pub const MIN_SIMULATIONS: usize = 10_000;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub fetch: FetchConfig,
    pub odds: OddsConfig,
    pub market_signal: MarketSignalConfig,
    pub simulation: SimulationConfig,
    pub endpoints: EndpointsConfig,
    pub server: ServerConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    /// One-shot runs only proceed inside the pre-tip window.
    pub pretip_only: bool,
    pub pretip_window_mins: i64,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "NBA_Quant_Edge_Daily".to_string(),
            pretip_only: false,
            pretip_window_mins: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Additional attempts after the first one.
    pub retries: u32,
    pub backoff_base_ms: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            retries: 3,
            backoff_base_ms: 1000,
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OddsConfig {
    pub api_key_env: String,
    pub region: String,
    pub markets: String,
    pub bookmakers: String,
}

impl Default for OddsConfig {
    fn default() -> Self {
        Self {
            api_key_env: "ODDS_API_KEY".to_string(),
            region: "us".to_string(),
            markets: "h2h,spreads,totals,team_totals,player_points,player_rebounds,\
                      player_assists,player_threes,player_pra"
                .to_string(),
            bookmakers: "draftkings,fanduel,betmgm,caesars".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MarketSignalConfig {
    pub url_env: String,
    pub key_env: String,
}

impl Default for MarketSignalConfig {
    fn default() -> Self {
        Self {
            url_env: "MARKET_SIGNAL_API_URL".to_string(),
            key_env: "MARKET_SIGNAL_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulationConfig {
    pub simulations: usize,
    /// Fixed RNG seed. Unset means fresh entropy on every run.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            simulations: 20_000,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Sample count actually used by the engine.
    pub fn effective_simulations(&self) -> usize {
        self.simulations.max(MIN_SIMULATIONS)
    }
}

/// Upstream base URLs. Overridable so staging mirrors can be used.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EndpointsConfig {
    pub schedule_primary: String,
    pub schedule_fallback: String,
    pub injuries: String,
    pub lineups: String,
    pub team_stats: String,
    pub boxscore: String,
    pub odds: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            schedule_primary: "https://data.nba.net/prod/v2".to_string(),
            schedule_fallback: "https://cdn.nba.com/static/json/staticData/scheduleLeagueV2.json"
                .to_string(),
            injuries: "https://site.api.espn.com/apis/site/v2/sports/basketball/nba/injuries"
                .to_string(),
            lineups: "https://www.rotowire.com/basketball/nba-lineups.php".to_string(),
            team_stats: "https://stats.nba.com/stats/leaguedashteamstats".to_string(),
            boxscore: "https://cdn.nba.com/static/json/liveData/boxscore".to_string(),
            odds: "https://api.the-odds-api.com/v4/sports/basketball_nba/odds".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub report_path: String,
    pub persist: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: "reports/today_latest.json".to_string(),
            persist: true,
        }
    }
}

/// Secrets resolved from the environment at startup.
#[derive(Clone, Default)]
pub struct Secrets {
    pub odds_api_key: Option<SecretString>,
    pub market_signal_url: Option<String>,
    pub market_signal_key: Option<SecretString>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("odds_api_key", &self.odds_api_key.as_ref().map(|_| "<redacted>"))
            .field("market_signal_url", &self.market_signal_url)
            .field("market_signal_key", &self.market_signal_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load the file if present, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if std::path::Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Resolve every secret referenced by name. Blank values count as unset.
    pub fn resolve_secrets(&self) -> Secrets {
        let non_blank = |name: &str| {
            Self::resolve_env(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Secrets {
            odds_api_key: non_blank(&self.odds.api_key_env).map(SecretString::new),
            market_signal_url: non_blank(&self.market_signal.url_env),
            market_signal_key: non_blank(&self.market_signal.key_env).map(SecretString::new),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg.app.name, "NBA_Quant_Edge_Daily");
        assert_eq!(cfg.fetch.retries, 3);
        assert_eq!(cfg.fetch.timeout_secs, 120);
        assert_eq!(cfg.simulation.simulations, 20_000);
        assert!(cfg.simulation.seed.is_none());
        assert_eq!(cfg.output.report_path, "reports/today_latest.json");
    }

    #[test]
    fn test_partial_section_override() {
        let cfg = AppConfig::from_toml(
            r#"
            [simulation]
            simulations = 50000
            seed = 7

            [odds]
            region = "eu"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.simulation.effective_simulations(), 50_000);
        assert_eq!(cfg.simulation.seed, Some(7));
        assert_eq!(cfg.odds.region, "eu");
        assert_eq!(cfg.odds.bookmakers, "draftkings,fanduel,betmgm,caesars");
    }

    #[test]
    fn test_simulation_floor() {
        let cfg = SimulationConfig { simulations: 500, seed: None };
        assert_eq!(cfg.effective_simulations(), MIN_SIMULATIONS);
    }

    #[test]
    fn test_secrets_debug_redacts() {
        let secrets = Secrets {
            odds_api_key: Some(SecretString::new("super-secret".into())),
            market_signal_url: None,
            market_signal_key: None,
        };
        let dbg = format!("{secrets:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("redacted"));
    }

    #[test]
    fn test_load_config() {
        // Only meaningful when config.toml is in the working directory.
        if let Ok(cfg) = AppConfig::load("config.toml") {
            assert!(!cfg.app.name.is_empty());
            assert!(cfg.simulation.effective_simulations() >= MIN_SIMULATIONS);
        }
    }
}

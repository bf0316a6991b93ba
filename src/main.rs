//! NBA Quant Edge: daily +EV report generator.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! then either serves the report over HTTP or performs a single run and
//! persists it.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};

use quant_edge::config::AppConfig;
use quant_edge::report::{in_pretip_window, Report, ReportGenerator};
use quant_edge::server::{self, ServerState};
use quant_edge::storage;
use quant_edge::upstream::ReqwestTransport;

#[derive(Parser)]
#[command(name = "quant-edge")]
#[command(about = "Daily NBA projection and +EV market report", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Defaults to `serve` when `server.enabled`, otherwise `run`
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Override `server.port`
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate one report, persist it and print it
    Run {
        /// Target date (YYYY-MM-DD); ignored without --allow-manual-override
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        allow_manual_override: bool,
        /// Skip the pre-tip window check
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    let cfg = AppConfig::load_or_default(&cli.config)?;
    init_logging();

    let secrets = cfg.resolve_secrets();
    info!(
        app_name = %cfg.app.name,
        odds_key = secrets.odds_api_key.is_some(),
        market_signals = secrets.market_signal_url.is_some(),
        simulations = cfg.simulation.effective_simulations(),
        "Quant Edge starting up"
    );

    let transport = Arc::new(ReqwestTransport::new(&cfg.fetch)?);
    let command = cli.command.unwrap_or(if cfg.server.enabled {
        Command::Serve { port: None }
    } else {
        Command::Run {
            date: None,
            allow_manual_override: false,
            force: false,
        }
    });

    match command {
        Command::Serve { port } => {
            let port = port.unwrap_or(cfg.server.port);
            let generator = ReportGenerator::new(transport, cfg, secrets);
            server::serve(Arc::new(ServerState::new(generator)), port).await
        }
        Command::Run {
            date,
            allow_manual_override,
            force,
        } => {
            let generator = ReportGenerator::new(transport, cfg, secrets);
            if !force && !pretip_ready(&generator).await {
                return Ok(());
            }
            let report = generator.generate(date, allow_manual_override).await;
            finish_run(&generator, &report)
        }
    }
}

/// With `app.pretip_only`, proceed only when the first game of the day is
/// about to tip.
async fn pretip_ready(generator: &ReportGenerator) -> bool {
    let app = &generator.config().app;
    if !app.pretip_only {
        return true;
    }

    let today = chrono::Local::now().date_naive();
    let games = match generator.data_client().fetch_schedule(today).await {
        Ok(fetched) => fetched.data,
        Err(e) => {
            warn!(error = %e, "Schedule unavailable for pre-tip check");
            return false;
        }
    };

    let ready = in_pretip_window(&games, Utc::now(), app.pretip_window_mins);
    if !ready {
        info!(
            games = games.len(),
            window_mins = app.pretip_window_mins,
            "Outside pre-tip window, skipping run"
        );
    }
    ready
}

fn finish_run(generator: &ReportGenerator, report: &Report) -> Result<()> {
    let output = &generator.config().output;
    if output.persist {
        storage::save_report(report, &output.report_path)?;
        info!(path = %output.report_path, "Report saved");
    }

    info!(
        status = %report.status,
        picks = report.ranked_picks.len(),
        degraded = report.degraded_mode,
        "Run complete"
    );
    let json = serde_json::to_string_pretty(report).context("Failed to serialise report")?;
    println!("{json}");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("quant_edge=info"));

    let json_logging = std::env::var("QUANT_EDGE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

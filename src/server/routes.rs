//! HTTP route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<ServerState>`.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::report::{AbortedReport, ReportGenerator};
use crate::storage;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct ServerState {
    pub generator: ReportGenerator,
    /// Where the latest report is persisted and served from.
    pub report_path: String,
    pub persist: bool,
}

impl ServerState {
    pub fn new(generator: ReportGenerator) -> Self {
        let output = &generator.config().output;
        Self {
            report_path: output.report_path.clone(),
            persist: output.persist,
            generator,
        }
    }
}

pub type AppState = Arc<ServerState>;

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub date: Option<String>,
    #[serde(default)]
    pub allow_manual_override: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn root() -> Json<Value> {
    Json(json!({"status": "NBA Quant Edge API is live"}))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({"status": "ok", "app_name": state.generator.app_name()}))
}

pub async fn get_report(State(state): State<AppState>, Query(query): Query<ReportQuery>) -> Response {
    let explicit = match query.date.as_deref().filter(|d| !d.is_empty()) {
        None => None,
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                warn!(date = raw, "Rejected report request with invalid date");
                return Json(AbortedReport::invalid_date(state.generator.app_name())).into_response();
            }
        },
    };

    let report = state.generator.generate(explicit, query.allow_manual_override).await;
    info!(status = %report.status, picks = report.ranked_picks.len(), "Report served");

    if state.persist {
        if let Err(e) = storage::save_report(&report, &state.report_path) {
            error!(error = %e, "Failed to persist report");
        }
    }
    Json(report).into_response()
}

pub async fn get_picks(State(state): State<AppState>) -> Json<Value> {
    match storage::load_report(&state.report_path) {
        Ok(Some(report)) => Json(report),
        Ok(None) => Json(json!({"error": "No picks generated yet"})),
        Err(e) => {
            error!(error = %e, "Failed to load saved report");
            Json(json!({"error": "No picks generated yet"}))
        }
    }
}

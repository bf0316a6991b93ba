//! Server: thin Axum wrapper around the report generator.
//!
//! CORS enabled so the report can be consumed from a browser.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

pub use routes::{AppState, ServerState};

/// Bind `0.0.0.0:{port}` and serve until the process stops.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind server port {port}"))?;
    info!(port, "Report server listening on http://localhost:{port}");

    axum::serve(listener, app).await.context("Report server error")
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/report", get(routes::get_report))
        .route("/picks", get(routes::get_picks))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, Secrets};
    use crate::report::ReportGenerator;
    use crate::upstream::transport::MockHttpTransport;
    use crate::upstream::HttpResponse;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn temp_report_path() -> String {
        let mut p = std::env::temp_dir();
        p.push(format!("quant_edge_server_{}.json", uuid::Uuid::new_v4()));
        p.to_string_lossy().to_string()
    }

    /// Every upstream answers 503; nothing is fetched when `get_expected` is false.
    fn test_state(get_expected: bool, report_path: &str) -> AppState {
        let mut mock = MockHttpTransport::new();
        if get_expected {
            mock.expect_get()
                .returning(|_| Ok(HttpResponse { status: 503, body: String::new() }));
        } else {
            mock.expect_get().never();
        }

        let mut cfg = AppConfig::default();
        cfg.fetch.retries = 0;
        cfg.fetch.backoff_base_ms = 0;
        cfg.simulation.seed = Some(7);
        cfg.output.report_path = report_path.to_string();

        let generator = ReportGenerator::new(Arc::new(mock), cfg, Secrets::default());
        Arc::new(ServerState::new(generator))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state(false, &temp_report_path()));
        let (status, json) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["app_name"], "NBA_Quant_Edge_Daily");
    }

    #[tokio::test]
    async fn test_root_endpoint() {
        let app = build_router(test_state(false, &temp_report_path()));
        let (status, json) = get_json(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "NBA Quant Edge API is live");
    }

    #[tokio::test]
    async fn test_invalid_date_aborts_without_fetching() {
        let app = build_router(test_state(false, &temp_report_path()));
        let (status, json) = get_json(app, "/report?date=10-19-2026&allow_manual_override=true").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "aborted");
        assert_eq!(json["message"], "Invalid date format. Use YYYY-MM-DD.");
        assert_eq!(json["app_name"], "NBA_Quant_Edge_Daily");
    }

    #[tokio::test]
    async fn test_picks_before_any_run() {
        let app = build_router(test_state(false, &temp_report_path()));
        let (_, json) = get_json(app, "/picks").await;
        assert_eq!(json["error"], "No picks generated yet");
    }

    #[tokio::test]
    async fn test_report_persists_and_picks_serves_it() {
        let path = temp_report_path();
        let state = test_state(true, &path);

        let (status, report) = get_json(
            build_router(state.clone()),
            "/report?date=2026-11-02&allow_manual_override=true",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["date"], "2026-11-02");
        assert_eq!(report["manual_override_used"], true);
        assert_eq!(report["degraded_mode"], true);
        assert_eq!(report["status"], "degraded");

        let (_, picks) = get_json(build_router(state), "/picks").await;
        assert_eq!(picks["run_id"], report["run_id"]);

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let app = build_router(test_state(false, &temp_report_path()));
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}

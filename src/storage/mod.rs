//! Report persistence.
//!
//! The latest report is kept as a single pretty-printed JSON document and
//! overwritten on every run.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::report::Report;

/// Write the report, creating parent directories as needed.
pub fn save_report(report: &Report, path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialise report")?;
    write_json(path, &json)?;
    debug!(path, picks = report.ranked_picks.len(), "Report saved");
    Ok(())
}

fn write_json(path: &str, json: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create report directory {}", parent.display()))?;
    }
    std::fs::write(path, json).context(format!("Failed to write report to {path}"))
}

/// Load the last saved report as raw JSON.
/// Returns None if no report has been written yet.
pub fn load_report(path: &str) -> Result<Option<serde_json::Value>> {
    if !Path::new(path).exists() {
        info!(path, "No saved report found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path).context(format!("Failed to read report from {path}"))?;
    let report: serde_json::Value =
        serde_json::from_str(&json).context(format!("Failed to parse report from {path}"))?;

    debug!(path, "Report loaded from disk");
    Ok(Some(report))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path(nested: bool) -> String {
        let mut p = std::env::temp_dir();
        if nested {
            p.push(format!("quant_edge_test_{}", uuid::Uuid::new_v4()));
            p.push("output");
        }
        p.push(format!("quant_edge_report_{}.json", uuid::Uuid::new_v4()));
        p.to_string_lossy().to_string()
    }

    #[test]
    fn test_write_creates_parents_and_loads() {
        let path = temp_path(true);
        write_json(&path, &json!({"status": "NO_EV", "ranked_picks": []}).to_string()).unwrap();

        let loaded = load_report(&path).unwrap().unwrap();
        assert_eq!(loaded["status"], "NO_EV");
        assert!(loaded["ranked_picks"].as_array().unwrap().is_empty());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let path = temp_path(false);
        write_json(&path, r#"{"run": 1}"#).unwrap();
        write_json(&path, r#"{"run": 2}"#).unwrap();
        assert_eq!(load_report(&path).unwrap().unwrap()["run"], 2);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_nonexistent() {
        let loaded = load_report("/tmp/quant_edge_nonexistent_report_12345.json").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_corrupt_is_error() {
        let path = temp_path(false);
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_report(&path).is_err());
        std::fs::remove_file(&path).unwrap();
    }
}

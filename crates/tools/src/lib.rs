//! Plan-file helpers shared by the `waypoint` binary.

use std::fs;
use std::path::{Path, PathBuf};

use elevation::{AdaptationOutcome, AdaptationReport};
use formats::{ImportError, export_plan_json, import_plan_json};
use mission::FlightPlanStore;
use mission::path::FlightStatistics;

#[derive(Debug)]
pub enum ToolError {
    Io { path: PathBuf, source: std::io::Error },
    Import { path: PathBuf, source: ImportError },
    Encode(serde_json::Error),
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            ToolError::Import { path, source } => write!(f, "{}: {source}", path.display()),
            ToolError::Encode(err) => write!(f, "encode plan: {err}"),
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolError::Io { source, .. } => Some(source),
            ToolError::Import { source, .. } => Some(source),
            ToolError::Encode(err) => Some(err),
        }
    }
}

pub fn load_plan(path: &Path) -> Result<FlightPlanStore, ToolError> {
    let payload = fs::read_to_string(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut store = FlightPlanStore::new();
    import_plan_json(&mut store, &payload).map_err(|source| ToolError::Import {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(store)
}

pub fn save_plan(store: &FlightPlanStore, path: &Path) -> Result<(), ToolError> {
    let payload = export_plan_json(store).map_err(ToolError::Encode)?;
    write_bytes(path, payload.as_bytes())
}

pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), ToolError> {
    fs::write(path, bytes).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn format_statistics(stats: &FlightStatistics) -> String {
    let minutes = (stats.duration_s / 60.0).floor();
    let seconds = stats.duration_s - minutes * 60.0;
    format!(
        "waypoints: {}\ndistance: {:.2} km\nhover: {:.0} s\nduration: {minutes:.0} min {seconds:.0} s",
        stats.waypoint_count,
        stats.distance_m / 1000.0,
        stats.hover_s,
    )
}

pub fn format_report(report: &AdaptationReport) -> String {
    let outcome = match report.outcome {
        AdaptationOutcome::Success => "all waypoints updated",
        AdaptationOutcome::Partial => "some waypoints updated",
        AdaptationOutcome::Failure => "no waypoints updated",
        AdaptationOutcome::NoWaypoints => "plan has no waypoints",
    };
    let mut out = format!("{:?}: {outcome} ({} updated)", report.mode, report.updated);
    if !report.unresolved.is_empty() {
        let ids: Vec<String> = report.unresolved.iter().map(ToString::to_string).collect();
        out.push_str(&format!("\nelevation unresolved: {}", ids.join(", ")));
    }
    if !report.low_clearance.is_empty() {
        let ids: Vec<String> = report.low_clearance.iter().map(ToString::to_string).collect();
        out.push_str(&format!("\nlow ground clearance: {}", ids.join(", ")));
    }
    out
}

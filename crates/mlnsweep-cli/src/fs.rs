use anyhow::{Context, Result};
use mlnsweep_core::SweepReport;
use std::path::Path;

/// Writes the sweep report as pretty JSON, creating parent directories.
pub fn write_report(path: &Path, report: &SweepReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report: {}", path.display()))
}

//! Verdict export: one pretty-printed JSON document per completed scan.

use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use vigil_core::{StorageError, Verdict};

/// Write `verdict` under `dir` as `scan_results_<timestamp>.json`. The
/// timestamp is filesystem-safe (no colons).
pub fn export_verdict(dir: &Path, verdict: &Verdict) -> Result<PathBuf, StorageError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("scan_results_{}.json", timestamp()));
    fs::write(&path, serde_json::to_string_pretty(verdict)?)?;
    Ok(path)
}

fn timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}{:02}{:02}T{:02}{:02}{:02}Z",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

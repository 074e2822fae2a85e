use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Aggregate engine counters for one scan. Missing upstream counters are 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictStats {
    #[serde(default)]
    pub malicious: u64,
    #[serde(default)]
    pub suspicious: u64,
    #[serde(default)]
    pub harmless: u64,
    #[serde(default)]
    pub undetected: u64,
}

impl VerdictStats {
    /// Overall status: malicious wins, then suspicious, else clean.
    pub fn status(&self) -> VerdictStatus {
        if self.malicious > 0 {
            VerdictStatus::Malicious
        } else if self.suspicious > 0 {
            VerdictStatus::Suspicious
        } else {
            VerdictStatus::Clean
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Malicious,
    Suspicious,
    Clean,
}

impl VerdictStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictStatus::Malicious => "malicious",
            VerdictStatus::Suspicious => "suspicious",
            VerdictStatus::Clean => "clean",
        }
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One third-party engine's finding within the aggregate response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineFinding {
    pub engine_name: String,
    pub category: String,
    /// Engine-specific verdict label, absent when the engine had nothing to say.
    pub result: Option<String>,
    pub method: String,
}

/// File attributes carried by file/hash reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub file_type: Option<String>,
    pub file_size: Option<u64>,
    pub md5: Option<String>,
    pub sha1: Option<String>,
    pub sha256: Option<String>,
}

/// Normalized outcome of one completed scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub scan_id: String,
    pub resource: String,
    /// RFC 3339 timestamp of the analysis (upstream date, else normalization time).
    pub scan_date: String,
    pub stats: VerdictStats,
    /// Findings keyed by engine name.
    pub engines: BTreeMap<String, EngineFinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_meta: Option<FileMeta>,
}

impl Verdict {
    pub fn status(&self) -> VerdictStatus {
        self.stats.status()
    }
}

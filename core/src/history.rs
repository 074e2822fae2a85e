use crate::target::TargetKind;
use crate::verdict::{VerdictStats, VerdictStatus};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

/// One completed scan, as persisted. Entries are immutable: the history
/// collection is only appended to (newest first) or cleared wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Time-ordered unique token (UUID v7).
    pub id: String,
    /// RFC 3339 creation timestamp.
    pub date: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: TargetKind,
    pub result: VerdictStats,
    pub status: VerdictStatus,
}

impl HistoryEntry {
    pub fn new(
        target: impl Into<String>,
        kind: TargetKind,
        result: VerdictStats,
        status: VerdictStatus,
    ) -> Self {
        HistoryEntry {
            id: Uuid::now_v7().to_string(),
            date: now_rfc3339(),
            target: target.into(),
            kind,
            result,
            status,
        }
    }
}

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::new())
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The four kinds of scannable input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    File,
    Hash,
    Url,
    Ip,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::File => "file",
            TargetKind::Hash => "hash",
            TargetKind::Url => "url",
            TargetKind::Ip => "ip",
        }
    }

    /// Human label used in user-facing error prefixes.
    pub fn label(&self) -> &'static str {
        match self {
            TargetKind::File => "File",
            TargetKind::Hash => "File hash",
            TargetKind::Url => "URL",
            TargetKind::Ip => "IP address",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local file selected for upload, as handed over by the platform picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandle {
    pub path: PathBuf,
    pub name: String,
    pub size: Option<u64>,
    pub mime_type: Option<String>,
}

/// A validated scan subject. The file handle exists only for the `File`
/// variant, so the handle-iff-file invariant holds by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    File(FileHandle),
    Hash(String),
    Url(String),
    Ip(String),
}

impl ScanTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            ScanTarget::File(_) => TargetKind::File,
            ScanTarget::Hash(_) => TargetKind::Hash,
            ScanTarget::Url(_) => TargetKind::Url,
            ScanTarget::Ip(_) => TargetKind::Ip,
        }
    }

    /// The string recorded in scan history: the file name for uploads, the
    /// raw value for everything else.
    pub fn display_target(&self) -> &str {
        match self {
            ScanTarget::File(handle) => &handle.name,
            ScanTarget::Hash(s) | ScanTarget::Url(s) | ScanTarget::Ip(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_target_prefers_file_name() {
        let t = ScanTarget::File(FileHandle {
            path: PathBuf::from("/tmp/cache/report.pdf"),
            name: "report.pdf".into(),
            size: Some(1024),
            mime_type: Some("application/pdf".into()),
        });
        assert_eq!(t.display_target(), "report.pdf");
        assert_eq!(t.kind(), TargetKind::File);
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TargetKind::Hash).unwrap(), "\"hash\"");
        assert_eq!(serde_json::to_string(&TargetKind::Ip).unwrap(), "\"ip\"");
    }
}

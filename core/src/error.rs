use crate::target::TargetKind;
use thiserror::Error;

/// Persistence failure in the key-value store or history collection.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Everything a scan can fail with, split so callers can react per class:
/// validation and config errors are raised before any network side effect,
/// timeouts are distinct from remote failures, and storage failures leave
/// the computed verdict intact.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Bad target format. Local, never retried.
    #[error("{message}")]
    Validation { code: &'static str, message: String },

    #[error("API key is not configured")]
    MissingApiKey,

    /// Non-success HTTP status or malformed payload from the analysis service.
    #[error("{message}")]
    Remote { message: String, status: Option<u16> },

    /// Polling exhausted its attempt or deadline budget.
    #[error("Analysis timed out. Please try again later.")]
    Timeout,

    #[error("scan cancelled")]
    Cancelled,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ScanError {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        ScanError::Validation { code, message: message.into() }
    }

    pub fn remote(message: impl Into<String>, status: Option<u16>) -> Self {
        ScanError::Remote { message: message.into(), status }
    }

    /// Machine-readable validation code, if this is a validation failure.
    pub fn validation_code(&self) -> Option<&'static str> {
        match self {
            ScanError::Validation { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Wrap a remote failure with the user-facing "<kind> scan failed: ..."
    /// prefix. Other classes pass through so callers keep the distinction.
    pub fn with_scan_prefix(self, kind: TargetKind) -> Self {
        match self {
            ScanError::Remote { message, status } => ScanError::Remote {
                message: format!("{} scan failed: {}", kind.label(), message),
                status,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_errors_take_kind_prefix() {
        let e = ScanError::remote("API Error: 500", Some(500)).with_scan_prefix(TargetKind::Url);
        assert_eq!(e.to_string(), "URL scan failed: API Error: 500");
    }

    #[test]
    fn timeout_keeps_canonical_message() {
        let e = ScanError::Timeout.with_scan_prefix(TargetKind::File);
        assert!(matches!(e, ScanError::Timeout));
        assert_eq!(e.to_string(), "Analysis timed out. Please try again later.");
    }

    #[test]
    fn validation_code_is_exposed() {
        let e = ScanError::validation("bad-hash-format", "Invalid hash format.");
        assert_eq!(e.validation_code(), Some("bad-hash-format"));
        assert_eq!(ScanError::MissingApiKey.validation_code(), None);
    }
}

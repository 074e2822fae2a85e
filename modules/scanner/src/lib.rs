//! Scan orchestration: classification, remote analysis, verdict recording,
//! and the device trust status derived from recorded history.

pub mod export;

use std::sync::Arc;

use history_store::HistoryStore;
use intel::{IntelClient, UploadEvent};
use log::warn;
use time::OffsetDateTime;
use tokio::sync::mpsc::UnboundedSender;
use vigil_core::{
    derive_status, CancelToken, DeviceStatus, HistoryEntry, ScanError, ScanTarget, StorageError,
    TargetKind, Verdict,
};

/// A finished scan. `recorded` is the persisted history entry, or the storage
/// failure if recording failed. The verdict stands either way.
#[derive(Debug)]
pub struct ScanOutcome {
    pub verdict: Verdict,
    pub recorded: Result<HistoryEntry, StorageError>,
}

pub struct Scanner {
    history: Arc<HistoryStore>,
    base_url: Option<String>,
}

impl Scanner {
    pub fn new(history: Arc<HistoryStore>) -> Self {
        Scanner { history, base_url: None }
    }

    /// Route requests to a mirror or a test server instead of the public API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Classify raw text input, then scan. File targets carry a handle and
    /// go through [`Scanner::scan`] directly.
    pub async fn scan_input(
        &self,
        kind: TargetKind,
        raw: &str,
        progress: Option<UnboundedSender<UploadEvent>>,
        cancel: &CancelToken,
    ) -> Result<ScanOutcome, ScanError> {
        let target = classify::classify(kind, raw)?;
        self.scan(target, progress, cancel).await
    }

    /// Run one scan to completion and record the verdict. The API key
    /// precondition is checked before any network call; remote failures are
    /// labelled with the target kind.
    pub async fn scan(
        &self,
        target: ScanTarget,
        progress: Option<UnboundedSender<UploadEvent>>,
        cancel: &CancelToken,
    ) -> Result<ScanOutcome, ScanError> {
        let api_key = self.history.api_key()?.ok_or(ScanError::MissingApiKey)?;
        let client = match &self.base_url {
            Some(base) => IntelClient::with_base_url(api_key, base.clone())?,
            None => IntelClient::new(api_key)?,
        };

        let kind = target.kind();
        let verdict = match &target {
            ScanTarget::File(handle) => client.scan_file(handle, progress.as_ref(), cancel).await,
            ScanTarget::Hash(hash) => client.scan_hash(hash).await,
            ScanTarget::Url(url) => client.scan_url(url, cancel).await,
            ScanTarget::Ip(ip) => client.scan_ip(ip).await,
        }
        .map_err(|e| e.with_scan_prefix(kind))?;

        let entry = HistoryEntry::new(
            target.display_target(),
            kind,
            verdict.stats.clone(),
            verdict.status(),
        );
        let recorded = match self.history.append(entry.clone()) {
            Ok(()) => Ok(entry),
            Err(e) => {
                warn!("verdict computed but history write failed: {e}");
                Err(e)
            }
        };
        Ok(ScanOutcome { verdict, recorded })
    }

    /// Trust tier derived from the recorded history, relative to now.
    pub fn device_status(&self) -> Result<DeviceStatus, StorageError> {
        Ok(derive_status(&self.history.entries()?, OffsetDateTime::now_utc()))
    }
}

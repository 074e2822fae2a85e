//! Client for the remote reputation and analysis service.
//!
//! Thin endpoint wrappers plus the four high-level scan flows (file, hash,
//! URL, IP). All flows end in a [`Verdict`]; polling and upload progress are
//! handled here so callers only see terminal results.

pub mod poll;
pub mod response;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use log::{debug, warn};
use reqwest::multipart;
use reqwest::{Body, Client};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc::UnboundedSender;
use vigil_core::{CancelToken, FileHandle, ScanError, TargetKind, Verdict};

use poll::{poll_until_complete, PollPlan, PollStep, FILE_ANALYSIS, URL_ANALYSIS};
use response::{
    error_message, normalize, AnalysisReport, ResourceReport, SubmissionResponse,
    UploadUrlResponse,
};

pub const DEFAULT_BASE_URL: &str = "https://www.virustotal.com/api/v3";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_CHUNK: usize = 64 * 1024;

/// Progress of a file upload, as a stream of events. Percentages are
/// monotonically non-decreasing; `Completed` is terminal for the upload leg
/// (analysis polling still follows).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadEvent {
    Progress { percent: u8 },
    Completed,
}

pub struct IntelClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl IntelClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ScanError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point at a mirror or a test server instead of the public API.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ScanError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ScanError::remote(format!("HTTP client error: {e}"), None))?;
        let base_url: String = base_url.into();
        Ok(IntelClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Identifier the service derives for URL resources: URL-safe,
    /// padding-free base64 of the URL itself.
    pub fn url_id(raw_url: &str) -> String {
        URL_SAFE_NO_PAD.encode(raw_url)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ScanError> {
        let resp = self
            .http
            .get(self.endpoint(path))
            .header("x-apikey", &self.api_key)
            .send()
            .await
            .map_err(into_remote)?;
        Self::parse(resp).await
    }

    async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ScanError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = error_message(status.as_u16(), &body);
            warn!("analysis service returned HTTP {status}: {message}");
            return Err(ScanError::remote(message, Some(status.as_u16())));
        }
        resp.json::<T>()
            .await
            .map_err(|e| ScanError::remote(format!("Malformed response: {e}"), None))
    }

    /// Canonical per-file verdict by digest. No submission, no polling.
    pub async fn scan_hash(&self, hash: &str) -> Result<Verdict, ScanError> {
        let report: ResourceReport = self.get_json(&format!("files/{hash}")).await?;
        Ok(normalize(&report, TargetKind::Hash))
    }

    pub async fn scan_ip(&self, ip: &str) -> Result<Verdict, ScanError> {
        let report: ResourceReport = self.get_json(&format!("ip_addresses/{ip}")).await?;
        Ok(normalize(&report, TargetKind::Ip))
    }

    /// URL lookup with on-miss submission: try the derived-id resource first;
    /// on a non-success HTTP status submit the URL for analysis, poll the
    /// job, then fetch the resource again. Transport failures (no status,
    /// e.g. DNS or connect errors) surface from the lookup leg directly.
    pub async fn scan_url(&self, raw_url: &str, cancel: &CancelToken) -> Result<Verdict, ScanError> {
        let id = Self::url_id(raw_url);
        match self.get_json::<ResourceReport>(&format!("urls/{id}")).await {
            Ok(report) => Ok(normalize(&report, TargetKind::Url)),
            Err(ScanError::Remote { status: Some(status), .. }) => {
                debug!("no stored URL verdict (HTTP {status}), submitting for analysis");
                let analysis_id = self.submit_url(raw_url).await?;
                self.wait_for_analysis(&analysis_id, &URL_ANALYSIS, cancel).await?;
                let report: ResourceReport = self.get_json(&format!("urls/{id}")).await?;
                Ok(normalize(&report, TargetKind::Url))
            }
            Err(other) => Err(other),
        }
    }

    /// Full file flow: existence check, upload-URL negotiation, streamed
    /// multipart upload with progress events, analysis polling, then the
    /// canonical verdict fetched by the digest the completed job reports.
    pub async fn scan_file(
        &self,
        handle: &FileHandle,
        progress: Option<&UnboundedSender<UploadEvent>>,
        cancel: &CancelToken,
    ) -> Result<Verdict, ScanError> {
        // Classification only validated the handle; the file must exist now.
        let meta = tokio::fs::metadata(&handle.path).await.map_err(|_| {
            ScanError::validation("file-missing", "File not found or inaccessible.")
        })?;

        let upload_url = self.fetch_upload_url().await?;
        let analysis_id = self.upload(&upload_url, handle, meta.len(), progress).await?;
        let analysis = self.wait_for_analysis(&analysis_id, &FILE_ANALYSIS, cancel).await?;

        // The verdict lives under the file resource keyed by the digest the
        // completed job carries, not under the analysis itself.
        let sha256 = analysis.file_sha256().ok_or_else(|| {
            ScanError::remote("Malformed response: completed analysis has no file digest", None)
        })?;
        let report: ResourceReport = self.get_json(&format!("files/{sha256}")).await?;
        Ok(normalize(&report, TargetKind::File))
    }

    async fn fetch_upload_url(&self) -> Result<String, ScanError> {
        let resp: UploadUrlResponse = self.get_json("files/upload_url").await?;
        Ok(resp.data)
    }

    async fn submit_url(&self, raw_url: &str) -> Result<String, ScanError> {
        let resp = self
            .http
            .post(self.endpoint("urls"))
            .header("x-apikey", &self.api_key)
            .form(&[("url", raw_url)])
            .send()
            .await
            .map_err(into_remote)?;
        let submission: SubmissionResponse = Self::parse(resp).await?;
        Ok(submission.data.id)
    }

    /// Stream the file from disk chunk by chunk, emitting a progress event
    /// per chunk, so large files are never buffered whole.
    async fn upload(
        &self,
        upload_url: &str,
        handle: &FileHandle,
        total: u64,
        progress: Option<&UnboundedSender<UploadEvent>>,
    ) -> Result<String, ScanError> {
        let tx = progress.cloned();

        let file = tokio::fs::File::open(&handle.path).await.map_err(|_| {
            ScanError::validation("file-missing", "File not found or inaccessible.")
        })?;
        let chunk_tx = tx.clone();
        let stream = futures_util::stream::try_unfold(
            (file, 0u64),
            move |(mut file, mut sent)| {
                let tx = chunk_tx.clone();
                async move {
                    let mut chunk = vec![0u8; UPLOAD_CHUNK];
                    let n = file.read(&mut chunk).await?;
                    if n == 0 {
                        return Ok(None);
                    }
                    chunk.truncate(n);
                    sent += n as u64;
                    if let Some(tx) = &tx {
                        let percent = ((sent * 100) / total.max(1)) as u8;
                        let _ = tx.send(UploadEvent::Progress { percent });
                    }
                    Ok::<_, std::io::Error>(Some((chunk, (file, sent))))
                }
            },
        );

        let part = multipart::Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(handle.name.clone())
            .mime_str(handle.mime_type.as_deref().unwrap_or("application/octet-stream"))
            .map_err(|e| ScanError::remote(format!("Invalid MIME type: {e}"), None))?;
        let form = multipart::Form::new().part("file", part);

        let resp = self
            .http
            .post(upload_url)
            .header("x-apikey", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(into_remote)?;
        let submission: SubmissionResponse = Self::parse(resp).await?;

        if let Some(tx) = &tx {
            let _ = tx.send(UploadEvent::Progress { percent: 100 });
            let _ = tx.send(UploadEvent::Completed);
        }
        Ok(submission.data.id)
    }

    async fn wait_for_analysis(
        &self,
        analysis_id: &str,
        plan: &PollPlan,
        cancel: &CancelToken,
    ) -> Result<AnalysisReport, ScanError> {
        poll_until_complete(plan, cancel, || async move {
            let report: AnalysisReport =
                self.get_json(&format!("analyses/{analysis_id}")).await?;
            if report.is_completed() {
                Ok(PollStep::Completed(report))
            } else {
                Ok(PollStep::Pending)
            }
        })
        .await
    }
}

fn into_remote(e: reqwest::Error) -> ScanError {
    ScanError::remote(format!("Request error: {e}"), e.status().map(|s| s.as_u16()))
}

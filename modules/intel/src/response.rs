//! Raw wire types for the analysis service and their normalization into the
//! shared verdict model. Upstream payloads are treated as hostile: every
//! field is optional and counters are coerced defensively.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use vigil_core::{now_rfc3339, EngineFinding, FileMeta, TargetKind, Verdict, VerdictStats};

/// `GET files/{hash}`, `GET urls/{id}`, `GET ip_addresses/{ip}`.
#[derive(Debug, Deserialize)]
pub struct ResourceReport {
    pub data: ResourceData,
}

#[derive(Debug, Deserialize)]
pub struct ResourceData {
    pub id: String,
    #[serde(default)]
    pub attributes: ResourceAttributes,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResourceAttributes {
    #[serde(default)]
    pub last_analysis_stats: Option<Value>,
    #[serde(default)]
    pub last_analysis_results: Option<BTreeMap<String, RawEngineResult>>,
    /// Unix timestamp, seconds.
    #[serde(default)]
    pub last_analysis_date: Option<i64>,
    #[serde(default)]
    pub type_description: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawEngineResult {
    #[serde(default)]
    pub engine_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

/// `GET analyses/{id}`: job status plus, for file jobs, the digest of the
/// analyzed file under `meta.file_info`.
#[derive(Debug, Deserialize)]
pub struct AnalysisReport {
    pub data: AnalysisData,
    #[serde(default)]
    pub meta: Option<AnalysisMeta>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisData {
    pub id: String,
    #[serde(default)]
    pub attributes: AnalysisAttributes,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisAttributes {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisMeta {
    #[serde(default)]
    pub file_info: Option<FileInfo>,
}

#[derive(Debug, Deserialize)]
pub struct FileInfo {
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub md5: Option<String>,
}

impl AnalysisReport {
    pub fn is_completed(&self) -> bool {
        self.data.attributes.status.as_deref() == Some("completed")
    }

    pub fn file_sha256(&self) -> Option<&str> {
        self.meta.as_ref()?.file_info.as_ref()?.sha256.as_deref()
    }
}

/// `GET files/upload_url`.
#[derive(Debug, Deserialize)]
pub struct UploadUrlResponse {
    pub data: String,
}

/// `POST urls` and the file upload endpoint both answer with an analysis id.
#[derive(Debug, Deserialize)]
pub struct SubmissionResponse {
    pub data: SubmissionData,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionData {
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// User-facing message for a failed response: the upstream `error.message`
/// when the body carries one, else `API Error: <status>`.
pub fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message)
        .unwrap_or_else(|| format!("API Error: {status}"))
}

/// Collapse a raw report into the normalized verdict. Missing counters are 0,
/// missing engine fields fall back to neutral defaults, and the scan date is
/// the upstream analysis date when present, else the normalization time.
pub fn normalize(report: &ResourceReport, kind: TargetKind) -> Verdict {
    let attrs = &report.data.attributes;
    let stats = extract_stats(attrs.last_analysis_stats.as_ref());

    let engines = attrs
        .last_analysis_results
        .as_ref()
        .map(|results| {
            results
                .iter()
                .map(|(name, raw)| {
                    let finding = EngineFinding {
                        engine_name: raw.engine_name.clone().unwrap_or_else(|| name.clone()),
                        category: raw.category.clone().unwrap_or_default(),
                        result: raw.result.clone(),
                        method: raw.method.clone().unwrap_or_else(|| "unknown".to_string()),
                    };
                    (name.clone(), finding)
                })
                .collect()
        })
        .unwrap_or_default();

    let scan_date = attrs
        .last_analysis_date
        .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(now_rfc3339);

    let file_meta = match kind {
        TargetKind::File | TargetKind::Hash => {
            let has_file_attrs = attrs.type_description.is_some()
                || attrs.size.is_some()
                || attrs.md5.is_some()
                || attrs.sha1.is_some()
                || attrs.sha256.is_some();
            has_file_attrs.then(|| FileMeta {
                file_type: attrs.type_description.clone(),
                file_size: attrs.size,
                md5: attrs.md5.clone(),
                sha1: attrs.sha1.clone(),
                sha256: attrs.sha256.clone(),
            })
        }
        TargetKind::Url | TargetKind::Ip => None,
    };

    Verdict {
        scan_id: report.data.id.clone(),
        resource: report.data.id.clone(),
        scan_date,
        stats,
        engines,
        file_meta,
    }
}

fn extract_stats(raw: Option<&Value>) -> VerdictStats {
    let counter = |key: &str| raw.and_then(|map| map.get(key)).map_or(0, coerce_count);
    VerdictStats {
        malicious: counter("malicious"),
        suspicious: counter("suspicious"),
        harmless: counter("harmless"),
        undetected: counter("undetected"),
    }
}

/// Counters arrive as integers in practice, but floats and garbage have been
/// observed. Anything non-finite or negative collapses to 0.
fn coerce_count(value: &Value) -> u64 {
    if let Some(n) = value.as_u64() {
        n
    } else if let Some(f) = value.as_f64() {
        if f.is_finite() && f > 0.0 {
            f as u64
        } else {
            0
        }
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::VerdictStatus;

    const FILE_REPORT: &str = include_str!("../tests/data/file_report_clean.json");

    #[test]
    fn normalizes_a_clean_file_report() {
        let report: ResourceReport = serde_json::from_str(FILE_REPORT).unwrap();
        let verdict = normalize(&report, TargetKind::Hash);

        assert_eq!(verdict.status(), VerdictStatus::Clean);
        assert_eq!(verdict.stats.harmless, 70);
        assert_eq!(verdict.stats.undetected, 2);
        assert_eq!(verdict.stats.malicious, 0);
        assert_eq!(verdict.scan_id, "d41d8cd98f00b204e9800998ecf8427e");

        let meta = verdict.file_meta.expect("file meta");
        assert_eq!(
            meta.sha256.as_deref(),
            Some("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
        assert_eq!(meta.file_size, Some(0));

        let finding = &verdict.engines["Sophos"];
        assert_eq!(finding.category, "harmless");
        assert_eq!(finding.result, None);
        assert_eq!(finding.method, "blacklist");
    }

    #[test]
    fn normalize_is_deterministic_for_a_fixed_payload() {
        let report: ResourceReport = serde_json::from_str(FILE_REPORT).unwrap();
        assert_eq!(normalize(&report, TargetKind::Hash), normalize(&report, TargetKind::Hash));
    }

    #[test]
    fn missing_stats_default_to_clean() {
        let report: ResourceReport =
            serde_json::from_str(r#"{"data": {"id": "x", "attributes": {}}}"#).unwrap();
        let verdict = normalize(&report, TargetKind::Url);
        assert_eq!(verdict.status(), VerdictStatus::Clean);
        assert!(verdict.engines.is_empty());
        assert!(verdict.file_meta.is_none());
    }

    #[test]
    fn garbage_counters_collapse_to_zero() {
        let raw = r#"{"data": {"id": "x", "attributes": {
            "last_analysis_stats": {"malicious": 1.9, "suspicious": -3, "harmless": "many", "undetected": null}
        }}}"#;
        let report: ResourceReport = serde_json::from_str(raw).unwrap();
        let verdict = normalize(&report, TargetKind::Ip);
        assert_eq!(verdict.stats.malicious, 1);
        assert_eq!(verdict.stats.suspicious, 0);
        assert_eq!(verdict.stats.harmless, 0);
        assert_eq!(verdict.stats.undetected, 0);
    }

    #[test]
    fn engine_method_defaults_to_unknown() {
        let raw = r#"{"data": {"id": "x", "attributes": {
            "last_analysis_results": {"Foo": {"category": "malicious", "result": "Trojan.Gen"}}
        }}}"#;
        let report: ResourceReport = serde_json::from_str(raw).unwrap();
        let verdict = normalize(&report, TargetKind::Hash);
        let finding = &verdict.engines["Foo"];
        assert_eq!(finding.engine_name, "Foo");
        assert_eq!(finding.method, "unknown");
        assert_eq!(finding.result.as_deref(), Some("Trojan.Gen"));
    }

    #[test]
    fn url_reports_never_carry_file_meta() {
        let raw = r#"{"data": {"id": "x", "attributes": {"size": 12, "sha256": "abc"}}}"#;
        let report: ResourceReport = serde_json::from_str(raw).unwrap();
        assert!(normalize(&report, TargetKind::Url).file_meta.is_none());
        assert!(normalize(&report, TargetKind::Hash).file_meta.is_some());
    }

    #[test]
    fn epoch_analysis_date_becomes_rfc3339() {
        let raw = r#"{"data": {"id": "x", "attributes": {"last_analysis_date": 1}}}"#;
        let report: ResourceReport = serde_json::from_str(raw).unwrap();
        let verdict = normalize(&report, TargetKind::Ip);
        assert_eq!(verdict.scan_date, "1970-01-01T00:00:01Z");
    }

    #[test]
    fn analysis_status_gates_completion() {
        let pending = r#"{"data": {"id": "a1", "attributes": {"status": "queued"}}}"#;
        let report: AnalysisReport = serde_json::from_str(pending).unwrap();
        assert!(!report.is_completed());
        assert!(report.file_sha256().is_none());

        let done = r#"{"data": {"id": "a1", "attributes": {"status": "completed"}},
            "meta": {"file_info": {"sha256": "deadbeef"}}}"#;
        let report: AnalysisReport = serde_json::from_str(done).unwrap();
        assert!(report.is_completed());
        assert_eq!(report.file_sha256(), Some("deadbeef"));
    }

    #[test]
    fn error_message_prefers_upstream_body() {
        let body = r#"{"error": {"code": "NotFoundError", "message": "File not found"}}"#;
        assert_eq!(error_message(404, body), "File not found");
        assert_eq!(error_message(500, ""), "API Error: 500");
        assert_eq!(error_message(502, "<html>bad gateway</html>"), "API Error: 502");
        assert_eq!(error_message(429, r#"{"error": {}}"#), "API Error: 429");
    }
}

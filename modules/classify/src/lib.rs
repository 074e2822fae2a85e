//! Target validation: tags raw input as a hash, URL, IP, or file before any
//! network call is made. No side effects, no I/O.

use regex::Regex;
use url::Url;
use vigil_core::{FileHandle, ScanError, ScanTarget, TargetKind};

/// Validate `raw` against the declared kind. File targets carry a picker
/// handle and go through [`classify_file`] instead.
pub fn classify(kind: TargetKind, raw: &str) -> Result<ScanTarget, ScanError> {
    let raw = raw.trim();
    match kind {
        TargetKind::Hash => classify_hash(raw),
        TargetKind::Url => classify_url(raw),
        TargetKind::Ip => classify_ip(raw),
        TargetKind::File => Err(ScanError::validation(
            "missing-file-handle",
            "Please select a file to scan.",
        )),
    }
}

/// Accept a picker-supplied file handle. Existence is re-checked at upload
/// time, not here; classification only requires a resolvable local path.
pub fn classify_file(handle: FileHandle) -> Result<ScanTarget, ScanError> {
    if handle.path.as_os_str().is_empty() {
        return Err(ScanError::validation(
            "missing-file-handle",
            "Selected file has no local path.",
        ));
    }
    Ok(ScanTarget::File(handle))
}

/// MD5, SHA-1 and SHA-256 digests: 32 to 64 hex characters.
fn classify_hash(raw: &str) -> Result<ScanTarget, ScanError> {
    let re = Regex::new(r"^[a-fA-F0-9]{32,64}$").unwrap();
    if !re.is_match(raw) {
        return Err(ScanError::validation(
            "bad-hash-format",
            "Invalid hash format. Please enter a valid MD5, SHA-1, or SHA-256 hash.",
        ));
    }
    Ok(ScanTarget::Hash(raw.to_string()))
}

fn classify_url(raw: &str) -> Result<ScanTarget, ScanError> {
    let parsed = Url::parse(raw).map_err(|_| bad_url())?;
    if parsed.host().is_none() {
        return Err(bad_url());
    }
    Ok(ScanTarget::Url(raw.to_string()))
}

fn bad_url() -> ScanError {
    ScanError::validation(
        "bad-url-format",
        "Invalid URL format. Please enter a valid URL including the scheme, e.g. http://",
    )
}

/// Dotted-quad IPv4. Unlike the permissive shape-only check this also
/// enforces the 0-255 octet range, so 999.999.999.999 is rejected.
fn classify_ip(raw: &str) -> Result<ScanTarget, ScanError> {
    let re = Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$").unwrap();
    if !re.is_match(raw) || raw.parse::<std::net::Ipv4Addr>().is_err() {
        return Err(ScanError::validation(
            "bad-ip-format",
            "Invalid IP address format. Please enter a valid IPv4 address.",
        ));
    }
    Ok(ScanTarget::Ip(raw.to_string()))
}

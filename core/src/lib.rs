//! Shared types and error taxonomy for the vigil scan engine.

pub mod cancel;
pub mod error;
pub mod history;
pub mod status;
pub mod target;
pub mod verdict;

pub use cancel::CancelToken;
pub use error::{ScanError, StorageError};
pub use history::{now_rfc3339, HistoryEntry};
pub use status::{derive_status, DeviceStatus};
pub use target::{FileHandle, ScanTarget, TargetKind};
pub use verdict::{EngineFinding, FileMeta, Verdict, VerdictStats, VerdictStatus};

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

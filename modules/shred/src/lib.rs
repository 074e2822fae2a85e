//! Secure-delete coordination.
//!
//! When a platform-native multi-pass eraser is wired in, deletion delegates
//! to it. Without one, the fallback is an ordinary delete with an explicitly
//! reduced guarantee, and only inside the configured data directory.

use log::{debug, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_PASSES: u32 = 3;

/// Native overwrite-and-delete primitive. The overwrite algorithm is opaque
/// to callers; they only probe availability and invoke.
pub trait SecureEraser: Send + Sync {
    fn is_available(&self) -> bool;
    fn erase(&self, path: &Path, passes: u32) -> Result<(), ShredError>;
}

#[derive(Debug, Error)]
pub enum ShredError {
    #[error("File not found or inaccessible: {0}")]
    NotFound(PathBuf),
    #[error("refusing to delete outside the data directory: {0}")]
    OutsideSandbox(PathBuf),
    #[error("native erase failed: {0}")]
    Native(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// How the file was actually removed. A `FallbackDelete` must never be
/// presented as a secure overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShredOutcome {
    /// Native multi-pass overwrite ran with the given pass count.
    SecureOverwrite { passes: u32 },
    /// Plain single-step deletion inside the sandbox; data not overwritten.
    FallbackDelete,
}

pub struct Shredder {
    native: Option<Box<dyn SecureEraser>>,
    sandbox_root: PathBuf,
}

impl Shredder {
    pub fn new(sandbox_root: impl Into<PathBuf>) -> Self {
        Shredder { native: None, sandbox_root: sandbox_root.into() }
    }

    pub fn with_native(mut self, eraser: Box<dyn SecureEraser>) -> Self {
        self.native = Some(eraser);
        self
    }

    pub fn native_available(&self) -> bool {
        self.native.as_deref().is_some_and(|n| n.is_available())
    }

    /// Remove `path`. Existence is checked first so callers get a uniform
    /// not-found error regardless of which deletion route would run.
    pub async fn shred(&self, path: &Path, passes: u32) -> Result<ShredOutcome, ShredError> {
        if tokio::fs::metadata(path).await.is_err() {
            return Err(ShredError::NotFound(path.to_path_buf()));
        }

        if let Some(native) = self.native.as_deref().filter(|n| n.is_available()) {
            debug!("native erase of {} with {passes} passes", path.display());
            native.erase(path, passes)?;
            return Ok(ShredOutcome::SecureOverwrite { passes });
        }

        // Fallback deletes are confined to our own data directory.
        let resolved = tokio::fs::canonicalize(path).await?;
        let sandbox = tokio::fs::canonicalize(&self.sandbox_root)
            .await
            .unwrap_or_else(|_| self.sandbox_root.clone());
        if !resolved.starts_with(&sandbox) {
            return Err(ShredError::OutsideSandbox(resolved));
        }
        warn!(
            "no native eraser, plain delete of {} (no overwrite guarantee)",
            resolved.display()
        );
        tokio::fs::remove_file(&resolved).await?;
        Ok(ShredOutcome::FallbackDelete)
    }
}

//! Transient storage for uploaded audio awaiting transcription.
//!
//! Every stored file gets an unconditional deletion sweep scheduled at write
//! time; consumption by the transcribe handler deletes earlier. Either way no
//! file outlives the TTL.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result as AnyResult};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Result, VoiceError};

pub const DEFAULT_SCRATCH_TTL: Duration = Duration::from_secs(5 * 60);

pub struct ScratchStore {
    root: PathBuf,
    ttl: Duration,
}

impl ScratchStore {
    pub fn new(root: impl Into<PathBuf>, ttl: Duration) -> AnyResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create scratch directory {:?}", root))?;
        Ok(Self { root, ttl })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist an uploaded payload under a fresh random identifier joined to
    /// the original filename, and schedule its removal sweep. A failed write
    /// leaves nothing behind.
    pub async fn store(&self, original_filename: &str, bytes: &[u8]) -> AnyResult<PathBuf> {
        // Only the final component of whatever name the client declared.
        let basename = Path::new(original_filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio");

        let path = self.root.join(format!("{}-{}", Uuid::new_v4(), basename));

        if let Err(e) = tokio::fs::write(&path, bytes).await {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e).with_context(|| format!("Failed to write scratch file {:?}", path));
        }

        info!("Stored {} bytes at {:?}", bytes.len(), path);
        self.schedule_sweep(path.clone());

        Ok(path)
    }

    /// Map a client-supplied path back to a live scratch file.
    ///
    /// Anything outside the scratch root, or no longer present, is
    /// `NotFound` — checked before the paid transcription call is made.
    pub async fn resolve(&self, requested: &str) -> Result<PathBuf> {
        let requested = Path::new(requested);
        let Some(name) = requested.file_name() else {
            return Err(VoiceError::NotFound);
        };
        if requested.parent() != Some(self.root.as_path()) {
            return Err(VoiceError::NotFound);
        }

        let path = self.root.join(name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(VoiceError::NotFound),
        }
    }

    /// Delete a scratch file. Idempotent: a file already gone is success.
    pub async fn remove(&self, path: &Path) -> std::io::Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Fire-and-forget removal after the TTL, tolerant of the file having
    /// been consumed already.
    fn schedule_sweep(&self, path: PathBuf) {
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => info!("Swept abandoned scratch file {:?}", path),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to sweep scratch file {:?}: {}", path, e),
            }
        });
    }
}

// crates/server/src/staging.rs
//! Upload staging: where images are written before the engine reads them.
//!
//! Jobs get a unique file each (`job-<id>.<ext>`), synchronous recognitions
//! get a unique scratch file, and the single-slot endpoint keeps using one
//! fixed path that every upload overwrites.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::AsyncWriteExt;

use crate::jobs::JobId;

/// Owns the staging directory and hands out paths inside it.
pub struct Staging {
    dir: PathBuf,
    legacy_path: PathBuf,
    scratch_seq: AtomicU64,
}

impl Staging {
    /// `legacy_path` is used as-is when absolute, otherwise resolved against `dir`.
    pub fn new(dir: impl Into<PathBuf>, legacy_path: impl AsRef<Path>) -> Self {
        let dir = dir.into();
        let legacy_path = if legacy_path.as_ref().is_absolute() {
            legacy_path.as_ref().to_path_buf()
        } else {
            dir.join(legacy_path)
        };
        Self {
            dir,
            legacy_path,
            scratch_seq: AtomicU64::new(1),
        }
    }

    /// Create the staging directory (and the legacy file's parent) if missing.
    pub async fn ensure_dirs(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        if let Some(parent) = self.legacy_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The fixed path shared by every single-slot upload.
    pub fn legacy_path(&self) -> &Path {
        &self.legacy_path
    }

    /// Unique path for a job's upload.
    pub fn job_path(&self, id: JobId, bytes: &[u8]) -> PathBuf {
        self.dir.join(format!("job-{id}.{}", sniff_extension(bytes)))
    }

    /// Unique path for a synchronous recognition.
    pub fn scratch_path(&self, bytes: &[u8]) -> PathBuf {
        let n = self.scratch_seq.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!("recognize-{}-{n}.{}", std::process::id(), sniff_extension(bytes)))
    }

    /// Write `bytes` to `path`, replacing any previous content.
    ///
    /// The handle is flushed and closed before this returns, so the engine
    /// never sees a partially written file.
    pub async fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }

    /// Best-effort removal; a missing file is not an error.
    pub async fn remove(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "failed to remove staged file")
            }
        }
    }
}

/// Pick a file extension from the image's magic bytes.
///
/// PaddleOCR only picks up files with an image extension, so uploads are
/// never staged extension-less. Unknown formats fall back to `png`.
pub fn sniff_extension(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "png",
        [0xFF, 0xD8, 0xFF, ..] => "jpg",
        [b'G', b'I', b'F', b'8', ..] => "gif",
        [b'B', b'M', ..] => "bmp",
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => "tiff",
        [b'%', b'P', b'D', b'F', ..] => "pdf",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "webp",
        _ => "png",
    }
}

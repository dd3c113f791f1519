//! Naming and storage of photos attached to issue reports.
//!
//! A stored upload is named `<millis>-<sanitized original name>` and lives in
//! `<public root>/uploads`, which the static file server exposes as
//! `/uploads/<name>`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub const UPLOADS_DIR: &str = "uploads";
pub const PUBLIC_PREFIX: &str = "/uploads/";

const FALLBACK_NAME: &str = "upload";
const MAX_NAME_CHARS: usize = 128;
const MAX_COLLISION_RETRIES: u32 = 1000;

/// Reduces a client-supplied file name to its last path component over
/// `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed: String = cleaned
        .trim_start_matches('.')
        .chars()
        .take(MAX_NAME_CHARS)
        .collect();

    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed
    }
}

/// Builds the on-disk name for an upload received at `at`.
///
/// `attempt` is 0 for the first try; later attempts insert a counter so
/// uploads with the same name in the same millisecond don't collide.
pub fn upload_file_name(at: DateTime<Utc>, original: &str, attempt: u32) -> String {
    let millis = at.timestamp_millis();
    let name = sanitize_file_name(original);
    if attempt == 0 {
        format!("{}-{}", millis, name)
    } else {
        format!("{}-{}-{}", millis, attempt, name)
    }
}

pub fn public_path(file_name: &str) -> String {
    format!("{}{}", PUBLIC_PREFIX, file_name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub file_name: String,
    pub public_path: String,
    pub disk_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Ensures `<public_root>/uploads` exists; an existing directory is fine.
    pub fn ensure(public_root: &Path) -> Result<Self> {
        let dir = public_root.join(UPLOADS_DIR);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create upload directory {}", dir.display()))?;
        Ok(UploadStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<StoredUpload> {
        self.store_at(Utc::now(), original_name, bytes).await
    }

    async fn store_at(
        &self,
        at: DateTime<Utc>,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredUpload> {
        for attempt in 0..MAX_COLLISION_RETRIES {
            let file_name = upload_file_name(at, original_name, attempt);
            let disk_path = self.dir.join(&file_name);

            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&disk_path)
                .await
            {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("Failed to create {}", disk_path.display()))
                }
            };

            file.write_all(bytes)
                .await
                .with_context(|| format!("Failed to write {}", disk_path.display()))?;
            file.flush().await?;

            tracing::debug!(file = %file_name, bytes = bytes.len(), "stored upload");
            return Ok(StoredUpload {
                public_path: public_path(&file_name),
                file_name,
                disk_path,
            });
        }

        anyhow::bail!(
            "Could not find a free upload name for '{}' after {} attempts",
            original_name,
            MAX_COLLISION_RETRIES
        )
    }
}

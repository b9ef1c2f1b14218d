// src/services/upload.rs
// DOCUMENTATION: Upload validation and storage for news photos
// PURPOSE: Check incoming file parts and persist them under generated names

use crate::db::OpContext;
use crate::errors::NewsError;
use crate::models::UploadPart;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

/// Extensions accepted for gallery photos (compared lower-cased)
pub const ALLOWED_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".gif"];

/// Per-file cap, also the most bytes ever copied from one part
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Batch cap when an article is created
pub const MAX_FILES_PER_ARTICLE: usize = 10;

/// Batch cap when photos are added to an existing article
pub const MAX_FILES_PER_ADDITION: usize = 5;

const FILE_PREFIX: &str = "berita";

/// Naming scheme for one batch
/// DOCUMENTATION: `<prefix>_<ownerId>_<timestamp>_<nonce>_<n><ext>`, with
/// `additional_` in front of `n` for photos added after creation. `n` starts
/// at 1 and the nonce is drawn once per batch.
#[derive(Debug, Clone)]
pub struct FileNaming {
    owner_id: String,
    timestamp: i64,
    nonce: String,
    additional: bool,
}

impl FileNaming {
    /// Names for the initial gallery of a new article
    pub fn initial(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            nonce: Uuid::new_v4().simple().to_string(),
            additional: false,
        }
    }

    /// Names for photos added to an existing article
    pub fn additional(owner_id: &str) -> Self {
        Self {
            additional: true,
            ..Self::initial(owner_id)
        }
    }

    pub fn filename(&self, sequence: usize, extension: &str) -> String {
        let tag = if self.additional { "additional_" } else { "" };
        format!(
            "{}_{}_{}_{}_{}{}{}",
            FILE_PREFIX, self.owner_id, self.timestamp, self.nonce, tag, sequence, extension
        )
    }
}

/// True for a bare file name that cannot escape the upload directory
pub fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Files written by one call, in write order
/// DOCUMENTATION: A name is recorded as soon as its file is created, so
/// `discard` also removes a file whose copy failed halfway
#[derive(Debug)]
pub struct StoredBatch {
    dir: PathBuf,
    filenames: Vec<String>,
}

impl StoredBatch {
    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    pub fn into_filenames(self) -> Vec<String> {
        self.filenames
    }

    /// Compensating cleanup: remove every file of this batch
    pub async fn discard(self) {
        if !self.filenames.is_empty() {
            log::warn!(
                "Discarding {} uploaded files after failure",
                self.filenames.len()
            );
        }
        remove_files(&self.dir, &self.filenames).await;
    }
}

/// Writes validated parts into one media directory
#[derive(Debug, Clone)]
pub struct UploadWriter {
    dir: PathBuf,
}

impl UploadWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reject a batch before any side effect
    /// DOCUMENTATION: Empty batch, too many files, a disallowed extension or a
    /// declared size over the cap are all ValidationErrors
    pub fn validate_batch(parts: &[UploadPart], max_files: usize) -> Result<(), NewsError> {
        if parts.is_empty() {
            return Err(NewsError::ValidationError(
                "at least one image must be uploaded".to_string(),
            ));
        }

        if parts.len() > max_files {
            return Err(NewsError::ValidationError(format!(
                "at most {} images can be uploaded at once",
                max_files
            )));
        }

        for part in parts {
            if !ALLOWED_EXTENSIONS.contains(&part.extension().as_str()) {
                return Err(NewsError::ValidationError(format!(
                    "file type not allowed for {}. Use: jpg, jpeg, png, gif",
                    part.original_name
                )));
            }

            if part.declared_size > MAX_FILE_SIZE {
                return Err(NewsError::ValidationError(format!(
                    "file {} is too large. Maximum 5MB per file",
                    part.original_name
                )));
            }
        }

        Ok(())
    }

    /// Validate and write a batch
    /// DOCUMENTATION: On error the returned batch is already discarded, so the
    /// caller only has to clean up when a later step fails
    pub async fn write_batch(
        &self,
        ctx: &OpContext,
        naming: &FileNaming,
        parts: Vec<UploadPart>,
        max_files: usize,
    ) -> Result<StoredBatch, NewsError> {
        Self::validate_batch(&parts, max_files)?;

        ctx.run("Create upload directory failed", fs::create_dir_all(&self.dir))
            .await?;

        let mut stored = StoredBatch {
            dir: self.dir.clone(),
            filenames: Vec::with_capacity(parts.len()),
        };

        for (i, part) in parts.into_iter().enumerate() {
            if let Err(e) = self.write_part(ctx, naming, i + 1, part, &mut stored).await {
                stored.discard().await;
                return Err(e);
            }
        }

        Ok(stored)
    }

    async fn write_part(
        &self,
        ctx: &OpContext,
        naming: &FileNaming,
        sequence: usize,
        part: UploadPart,
        stored: &mut StoredBatch,
    ) -> Result<(), NewsError> {
        let filename = naming.filename(sequence, &part.extension());
        let path = self.dir.join(&filename);

        // create_new: a colliding name fails instead of clobbering another photo
        let mut file = ctx
            .run(
                "Create upload file failed",
                OpenOptions::new().write(true).create_new(true).open(&path),
            )
            .await?;
        stored.filenames.push(filename);

        let mut reader = part.reader.take(MAX_FILE_SIZE);
        let written = ctx
            .run("Write upload file failed", async {
                let written = tokio::io::copy(&mut reader, &mut file).await?;
                file.flush().await?;
                Ok::<_, std::io::Error>(written)
            })
            .await?;

        if written < part.declared_size {
            log::debug!(
                "Short read for {}: declared {} bytes, stored {}",
                part.original_name,
                part.declared_size,
                written
            );
        }

        Ok(())
    }

    /// Best-effort removal of files from this directory
    /// DOCUMENTATION: Missing files and removal errors are ignored (logged only)
    pub async fn remove_best_effort(&self, filenames: &[String]) {
        remove_files(&self.dir, filenames).await;
    }
}

async fn remove_files(dir: &Path, filenames: &[String]) {
    for name in filenames {
        if !is_plain_filename(name) {
            continue;
        }
        let path = dir.join(name);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            continue;
        }
        if let Err(e) = fs::remove_file(&path).await {
            log::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

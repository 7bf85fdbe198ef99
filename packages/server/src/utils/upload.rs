use std::path::{Path, PathBuf};

use atelier_common::storage::WorkStore;
use axum::extract::Multipart;
use axum::extract::multipart::Field;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::AppError;

/// Multipart field carrying the work's content tree. File names are relative
/// paths; folder hierarchy is preserved.
pub const CONTENT_FIELD: &str = "content";
/// Multipart field carrying exactly one image placed directly under the
/// field folder.
pub const THUMBNAIL_FIELD: &str = "thumbnail";

/// One uploaded file parked in the staging area.
#[derive(Debug)]
pub struct StagedFile {
    /// Path relative to the field folder.
    pub rel_path: String,
    pub size: u64,
}

/// An upload parked under the store's `.tmp` area, mirroring the final
/// `<field>/...` layout so materializing is a single rename per field.
#[derive(Debug)]
pub struct StagedUpload {
    staging_dir: PathBuf,
    pub content: Vec<StagedFile>,
    pub thumbnail: Option<StagedFile>,
}

impl StagedUpload {
    /// Number of files that survived filtering.
    pub fn file_count(&self) -> usize {
        self.content.len() + usize::from(self.thumbnail.is_some())
    }

    /// Total staged bytes.
    pub fn total_bytes(&self) -> u64 {
        let content: u64 = self.content.iter().map(|f| f.size).sum();
        content + self.thumbnail.as_ref().map_or(0, |t| t.size)
    }

    /// Move the staged field folders into the work's active directory and
    /// return the field-relative paths now live.
    pub async fn materialize(&self, work_dir: &Path) -> Result<Vec<String>, AppError> {
        let mut served = Vec::with_capacity(self.file_count());

        if !self.content.is_empty() {
            move_field_dir(
                &self.staging_dir.join(CONTENT_FIELD),
                &work_dir.join(CONTENT_FIELD),
            )
            .await?;
            for f in &self.content {
                served.push(format!("{CONTENT_FIELD}/{}", f.rel_path));
            }
        }

        if let Some(thumb) = &self.thumbnail {
            move_field_dir(
                &self.staging_dir.join(THUMBNAIL_FIELD),
                &work_dir.join(THUMBNAIL_FIELD),
            )
            .await?;
            served.push(format!("{THUMBNAIL_FIELD}/{}", thumb.rel_path));
        }

        Ok(served)
    }

    /// Remove whatever is left in the staging area. Best effort; failures
    /// are logged, never propagated.
    pub async fn cleanup(&self) {
        if let Err(e) = fs::remove_dir_all(&self.staging_dir).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(dir = %self.staging_dir.display(), "failed to clean staging dir: {e}");
        }
    }
}

/// Parse a multipart request into the staging area.
///
/// `content` files keep their relative folder hierarchy; any file whose path
/// contains a segment starting with `.` is silently dropped. `thumbnail`
/// accepts exactly one flat-named image file. The running byte total across
/// all accepted files is capped at `max_upload_size`.
pub async fn stage_multipart(
    store: &WorkStore,
    multipart: &mut Multipart,
    max_upload_size: u64,
) -> Result<StagedUpload, AppError> {
    let staging_dir = store.staging_dir();
    let mut staged = StagedUpload {
        staging_dir,
        content: Vec::new(),
        thumbnail: None,
    };

    let mut budget = max_upload_size;

    let result = async {
        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            match field.name() {
                Some(CONTENT_FIELD) => {
                    let Some(raw_name) = field.file_name().map(|s| s.to_string()) else {
                        continue;
                    };
                    let Some(rel_path) = normalize_content_path(&raw_name)? else {
                        // Hidden segment; drop the file without reading it.
                        continue;
                    };
                    let dest = staged.staging_dir.join(CONTENT_FIELD).join(&rel_path);
                    let size = stream_field_to(&mut field, &dest, &mut budget).await?;
                    record_content_file(&mut staged.content, rel_path, size);
                }
                Some(THUMBNAIL_FIELD) => {
                    if staged.thumbnail.is_some() {
                        return Err(AppError::Validation(
                            "Only one thumbnail file is allowed".into(),
                        ));
                    }
                    let raw_name = field.file_name().map(|s| s.to_string()).ok_or_else(|| {
                        AppError::Validation("Thumbnail field must carry a file".into())
                    })?;
                    let filename = validate_thumbnail_filename(&raw_name)?;
                    let dest = staged.staging_dir.join(THUMBNAIL_FIELD).join(&filename);
                    let size = stream_field_to(&mut field, &dest, &mut budget).await?;
                    staged.thumbnail = Some(StagedFile {
                        rel_path: filename,
                        size,
                    });
                }
                _ => {} // Ignore unknown fields.
            }
        }
        Ok(())
    }
    .await;

    match result {
        Ok(()) => Ok(staged),
        Err(e) => {
            staged.cleanup().await;
            Err(e)
        }
    }
}

/// Record one staged content file. A part re-sent under an already-staged
/// path has overwritten the earlier bytes on disk, so the earlier entry is
/// replaced rather than duplicated; only the last part's size counts.
fn record_content_file(files: &mut Vec<StagedFile>, rel_path: String, size: u64) {
    match files.iter_mut().find(|f| f.rel_path == rel_path) {
        Some(existing) => existing.size = size,
        None => files.push(StagedFile { rel_path, size }),
    }
}

/// Normalize a content file's relative path.
///
/// Returns `Ok(None)` when the path contains a hidden segment (the file is
/// filtered, not an error), `Err` for anything unsafe or malformed.
pub fn normalize_content_path(raw: &str) -> Result<Option<String>, AppError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(AppError::Validation("Content path cannot be empty".into()));
    }
    if trimmed.len() > 512 {
        return Err(AppError::Validation(
            "Content path exceeds maximum length of 512 characters".into(),
        ));
    }
    if trimmed.contains('\0') {
        return Err(AppError::Validation(
            "Content path must not contain null bytes".into(),
        ));
    }
    if trimmed.contains('\\') {
        return Err(AppError::Validation(
            "Content path must not contain backslashes".into(),
        ));
    }
    if trimmed.starts_with('/') || trimmed.ends_with('/') || trimmed.contains("//") {
        return Err(AppError::Validation(
            "Content path must be relative with single slashes".into(),
        ));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.' | ' '))
    {
        return Err(AppError::Validation(
            "Content path contains invalid characters".into(),
        ));
    }

    for segment in trimmed.split('/') {
        if segment == ".." {
            return Err(AppError::Validation(
                "Content path must not contain '..' traversal".into(),
            ));
        }
        if segment.starts_with('.') {
            return Ok(None);
        }
    }

    Ok(Some(trimmed.to_string()))
}

/// Validate a thumbnail filename: flat (no directories) and an image
/// extension.
pub fn validate_thumbnail_filename(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(AppError::Validation("Thumbnail filename cannot be empty".into()));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(AppError::Validation(
            "Thumbnail must be a single file, not a folder".into(),
        ));
    }
    if trimmed.contains('\0') || trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(AppError::Validation(
            "Thumbnail filename contains invalid characters".into(),
        ));
    }
    if trimmed.starts_with('.') {
        return Err(AppError::Validation(
            "Thumbnail filename must not start with '.'".into(),
        ));
    }

    let is_image = mime_guess::from_path(trimmed)
        .first()
        .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE);
    if !is_image {
        return Err(AppError::Validation(
            "Thumbnail must have an image extension (e.g. .png, .jpg, .gif, .webp)".into(),
        ));
    }

    Ok(trimmed.to_string())
}

/// Stream a multipart field into `dest`, debiting the shared byte budget.
async fn stream_field_to(
    field: &mut Field<'_>,
    dest: &Path,
    budget: &mut u64,
) -> Result<u64, AppError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create staging dir: {e}")))?;
    }

    let mut file = fs::File::create(dest)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create staging file: {e}")))?;

    let mut size: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        size += chunk.len() as u64;
        if size > *budget {
            return Err(AppError::Validation(
                "Upload exceeds the maximum request size".into(),
            ));
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Staging write failed: {e}")))?;
    }

    file.flush()
        .await
        .map_err(|e| AppError::Internal(format!("Staging flush failed: {e}")))?;

    *budget -= size;
    Ok(size)
}

async fn move_field_dir(from: &Path, to: &Path) -> Result<(), AppError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create work dir: {e}")))?;
    }
    fs::rename(from, to)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to move staged field: {e}")))
}

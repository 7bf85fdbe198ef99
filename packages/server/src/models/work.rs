use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::work::{self, BackupEntry};

#[derive(Serialize, utoipa::ToSchema)]
pub struct BackupResponse {
    /// Backup name; doubles as the backup directory name.
    #[schema(example = "1")]
    pub name: String,
    pub file_size: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<BackupEntry> for BackupResponse {
    fn from(b: BackupEntry) -> Self {
        Self {
            name: b.name,
            file_size: b.file_size,
            uploaded_at: b.uploaded_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct WorkResponse {
    pub creator_id: String,
    pub work_id: String,
    pub owner_id: i32,
    /// Bytes of the currently active content.
    pub file_size: i64,
    pub uploaded_at: DateTime<Utc>,
    pub backups: Vec<BackupResponse>,
}

impl From<work::Model> for WorkResponse {
    fn from(m: work::Model) -> Self {
        let backups = m.backup_entries().into_iter().map(Into::into).collect();
        Self {
            creator_id: m.creator_id,
            work_id: m.work_id,
            owner_id: m.owner_id,
            file_size: m.file_size,
            uploaded_at: m.uploaded_at,
            backups,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    /// Public paths now serving the uploaded content, e.g.
    /// `/uploads/acme/demo/content/index.html`.
    pub served_paths: Vec<String>,
    pub work: WorkResponse,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RenameRequest {
    #[schema(example = "umbrella")]
    pub new_creator_id: String,
    #[schema(example = "demo-2")]
    pub new_work_id: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct WorkListResponse {
    pub works: Vec<WorkResponse>,
    pub total: u64,
    /// Current total stored bytes (active + backups) across all works.
    pub usage_bytes: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BackupListResponse {
    pub backups: Vec<BackupResponse>,
    pub total: u64,
}

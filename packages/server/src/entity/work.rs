use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One retained prior version of a work.
/// Stored as a JSON array on the work row, ordered oldest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BackupEntry {
    /// Decimal string, strictly increasing per work; doubles as the backup
    /// directory name.
    pub name: String,
    pub file_size: i64,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// `(creator_id, work_id)` is the logical key. Uniqueness is enforced
    /// procedurally at the lifecycle layer, not by a DB constraint.
    pub creator_id: String,
    pub work_id: String,

    pub owner_id: i32,
    #[sea_orm(belongs_to, from = "owner_id", to = "id")]
    pub owner: HasOne<super::user::Entity>,

    /// Bytes of the currently active (non-backup) content.
    pub file_size: i64,
    /// Timestamp of the most recent active upload.
    pub uploaded_at: DateTimeUtc,

    /// Backup chain as a JSON array of [`BackupEntry`] objects.
    #[sea_orm(column_type = "JsonBinary")]
    pub backups: serde_json::Value,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Decode the backup chain. A malformed column decodes as empty rather
    /// than failing the whole request.
    pub fn backup_entries(&self) -> Vec<BackupEntry> {
        entries_from_json(&self.backups)
    }

    /// Active bytes plus every retained backup's bytes.
    pub fn total_size(&self) -> u64 {
        total_size(self.file_size, &self.backup_entries())
    }
}

pub fn entries_from_json(value: &serde_json::Value) -> Vec<BackupEntry> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Encode a backup chain for storage.
pub fn backups_to_json(entries: &[BackupEntry]) -> serde_json::Value {
    serde_json::to_value(entries).unwrap_or_else(|_| serde_json::Value::Array(Vec::new()))
}

pub fn total_size(file_size: i64, entries: &[BackupEntry]) -> u64 {
    let backup_bytes: i64 = entries.iter().map(|b| b.file_size).sum();
    u64::try_from(file_size + backup_bytes).unwrap_or(0)
}

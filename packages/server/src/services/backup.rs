//! Backup Chain Manager: numbered, append-only prior versions of a work.

use atelier_common::storage::{WorkStore, ids};
use sea_orm::*;

use crate::entity::work::{self, BackupEntry, backups_to_json};
use crate::error::AppError;
use crate::state::AppState;

use super::lifecycle::{find_owned, validate_key};

/// Move the work's active tree into the next numbered backup slot and append
/// the matching entry to `entries`.
///
/// Move first, append second: if the move fails the entry list is untouched,
/// so callers observe all-or-nothing from this step. Persisting the record
/// is the caller's job.
pub(crate) async fn backup_active_tree(
    store: &WorkStore,
    record: &work::Model,
    entries: &mut Vec<BackupEntry>,
) -> Result<String, AppError> {
    let name = store
        .backup_active(&record.creator_id, &record.work_id)
        .await?;
    entries.push(BackupEntry {
        name: name.clone(),
        file_size: record.file_size,
        uploaded_at: record.uploaded_at,
    });
    Ok(name)
}

/// Restore a named backup into the active slot.
///
/// The pre-restore active content is preserved as a new backup first, so a
/// restore never destroys data. The restored entry leaves the chain and its
/// recorded size/timestamp become the work's active ones.
pub async fn restore_backup(
    state: &AppState,
    requester_id: i32,
    creator_id: &str,
    work_id: &str,
    backup_name: &str,
) -> Result<work::Model, AppError> {
    let (creator_id, work_id) = validate_key(creator_id, work_id)?;
    if !ids::is_valid_backup_name(backup_name) {
        return Err(AppError::IdInvalid("backup name"));
    }

    let lock = state.locks.work(&creator_id, &work_id);
    let _guard = lock.lock().await;

    let record = find_owned(&state.db, &creator_id, &work_id, requester_id).await?;

    let mut entries = record.backup_entries();
    let idx = entries
        .iter()
        .position(|b| b.name == backup_name)
        .ok_or(AppError::BackupNotFound)?;
    if !state
        .store
        .backup_exists(&creator_id, &work_id, backup_name)
        .await?
    {
        // Record says it exists but the directory is gone; surface rather
        // than restore garbage.
        tracing::error!(%creator_id, %work_id, backup_name, "backup entry has no directory");
        return Err(AppError::BackupNotFound);
    }

    if state.store.active_exists(&creator_id, &work_id).await? {
        backup_active_tree(&state.store, &record, &mut entries).await?;
    }

    state
        .store
        .promote_backup(&creator_id, &work_id, backup_name)
        .await?;

    let restored = entries.remove(idx);
    let mut active: work::ActiveModel = record.into();
    active.file_size = Set(restored.file_size);
    active.uploaded_at = Set(restored.uploaded_at);
    active.backups = Set(backups_to_json(&entries));
    Ok(active.update(&state.db).await?)
}

/// Permanently delete a named backup, on disk and in the record.
pub async fn delete_backup(
    state: &AppState,
    requester_id: i32,
    creator_id: &str,
    work_id: &str,
    backup_name: &str,
) -> Result<work::Model, AppError> {
    let (creator_id, work_id) = validate_key(creator_id, work_id)?;
    if !ids::is_valid_backup_name(backup_name) {
        return Err(AppError::IdInvalid("backup name"));
    }

    let lock = state.locks.work(&creator_id, &work_id);
    let _guard = lock.lock().await;

    let record = find_owned(&state.db, &creator_id, &work_id, requester_id).await?;

    let mut entries = record.backup_entries();
    let idx = entries
        .iter()
        .position(|b| b.name == backup_name)
        .ok_or(AppError::BackupNotFound)?;

    state
        .store
        .remove_backup(&creator_id, &work_id, backup_name)
        .await?;

    entries.remove(idx);
    let mut active: work::ActiveModel = record.into();
    active.backups = Set(backups_to_json(&entries));
    Ok(active.update(&state.db).await?)
}

//! Work Lifecycle Service: upload, rename and delete of a work.
//!
//! Per key, a work moves NoWork -> Active -> Active(with backups), with
//! overwrite uploads looping on Active and delete terminal from any Active
//! state. Every mutation here runs under the per-key mutex; upload
//! additionally holds the global quota mutex from the headroom check through
//! the record write.

use atelier_common::storage::ids::{self, IdError};
use chrono::Utc;
use sea_orm::*;

use crate::entity::work::{self, backups_to_json};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::upload::StagedUpload;

use super::{backup, ownership, quota};

pub struct UploadOutcome {
    pub work: work::Model,
    /// Public paths now serving the uploaded content.
    pub served_paths: Vec<String>,
}

/// Upload (create or overwrite) a work from staged multipart content.
///
/// On overwrite the previous active content becomes a new numbered backup.
/// A failed upload performs no rollback of files already moved in; callers
/// must treat the work's state as unknown and re-upload to repair.
pub async fn upload(
    state: &AppState,
    requester_id: i32,
    creator_id: &str,
    work_id: &str,
    staged: &StagedUpload,
) -> Result<UploadOutcome, AppError> {
    let (creator_id, work_id) = validate_key(creator_id, work_id)?;

    let key_lock = state.locks.work(&creator_id, &work_id);
    let _key_guard = key_lock.lock().await;
    let quota_lock = state.locks.quota();
    let _quota_guard = quota_lock.lock().await;

    if !quota::admits(
        &state.db,
        state.config.storage.quota_bytes,
        staged.total_bytes(),
    )
    .await?
    {
        return Err(AppError::StorageFull);
    }
    // Runs before the record lookup: even a brand-new key is rejected when
    // the creator id belongs to someone else.
    if ownership::is_claimed_by_other(&state.db, &creator_id, requester_id).await? {
        return Err(AppError::CreatorIdInUse);
    }

    let existing = find_work(&state.db, &creator_id, &work_id).await?;

    let mut entries = existing
        .as_ref()
        .map(work::Model::backup_entries)
        .unwrap_or_default();

    let active_on_disk = state.store.active_exists(&creator_id, &work_id).await?;
    match (&existing, active_on_disk) {
        // Overwrite-with-history.
        (Some(record), true) => {
            backup::backup_active_tree(&state.store, record, &mut entries).await?;
        }
        // Orphan directory from an earlier failure; replace it.
        (None, true) => {
            tracing::warn!(%creator_id, %work_id, "active directory without a record; replacing");
            state.store.remove_active(&creator_id, &work_id).await?;
        }
        _ => {}
    }

    let work_dir = state.store.paths().work_dir(&creator_id, &work_id);
    let served_rel = staged.materialize(&work_dir).await?;
    if staged.file_count() == 0 {
        return Err(AppError::NoFilesUploaded);
    }

    let now = Utc::now();
    let file_size = i64::try_from(staged.total_bytes()).unwrap_or(i64::MAX);

    let model = match existing {
        Some(record) => {
            let mut active: work::ActiveModel = record.into();
            active.file_size = Set(file_size);
            active.uploaded_at = Set(now);
            active.backups = Set(backups_to_json(&entries));
            active.update(&state.db).await?
        }
        None => {
            work::ActiveModel {
                creator_id: Set(creator_id.clone()),
                work_id: Set(work_id.clone()),
                owner_id: Set(requester_id),
                file_size: Set(file_size),
                uploaded_at: Set(now),
                backups: Set(backups_to_json(&entries)),
                ..Default::default()
            }
            .insert(&state.db)
            .await?
        }
    };

    ownership::record_claim(&state.db, requester_id, &creator_id).await?;

    let served_paths = served_rel
        .into_iter()
        .map(|p| format!("/uploads/{creator_id}/{work_id}/{p}"))
        .collect();

    Ok(UploadOutcome {
        work: model,
        served_paths,
    })
}

/// Move a work (record, active tree and backup chain) to a new identity.
pub async fn rename(
    state: &AppState,
    requester_id: i32,
    creator_id: &str,
    work_id: &str,
    new_creator_id: &str,
    new_work_id: &str,
) -> Result<work::Model, AppError> {
    let (creator_id, work_id) = validate_key(creator_id, work_id)?;
    let new_creator_id = validate_id_field(new_creator_id, "new creator id")?;
    let new_work_id = validate_id_field(new_work_id, "new work id")?;

    if creator_id == new_creator_id && work_id == new_work_id {
        return Err(AppError::RenameToSame);
    }

    let (first, second) = state
        .locks
        .work_pair((&creator_id, &work_id), (&new_creator_id, &new_work_id));
    let _g1 = first.lock().await;
    let _g2 = second.lock().await;

    let record = find_owned(&state.db, &creator_id, &work_id, requester_id).await?;

    if new_creator_id != creator_id
        && ownership::is_claimed_by_other(&state.db, &new_creator_id, requester_id).await?
    {
        return Err(AppError::CreatorIdInUse);
    }
    if find_work(&state.db, &new_creator_id, &new_work_id)
        .await?
        .is_some()
    {
        return Err(AppError::RenameToExisting);
    }

    // Two independent renames (backup tree first, then active). A failure
    // in between leaves the trees split across the two keys; that needs
    // manual reconciliation, so shout.
    state
        .store
        .move_work(&creator_id, &work_id, &new_creator_id, &new_work_id)
        .await
        .map_err(|e| {
            tracing::error!(
                %creator_id, %work_id, %new_creator_id, %new_work_id,
                "rename move failed; trees may be split across keys: {e}"
            );
            AppError::from(e)
        })?;

    let mut active: work::ActiveModel = record.into();
    active.creator_id = Set(new_creator_id.clone());
    active.work_id = Set(new_work_id.clone());
    let model = active.update(&state.db).await?;

    ownership::record_claim(&state.db, requester_id, &new_creator_id).await?;

    Ok(model)
}

/// Delete a work: record, active tree and every backup.
///
/// Does not prune the owner's claimed creator ids; that is the separate
/// cleanup operation.
pub async fn delete(
    state: &AppState,
    requester_id: i32,
    creator_id: &str,
    work_id: &str,
) -> Result<(), AppError> {
    let (creator_id, work_id) = validate_key(creator_id, work_id)?;

    let lock = state.locks.work(&creator_id, &work_id);
    let _guard = lock.lock().await;

    let record = find_owned(&state.db, &creator_id, &work_id, requester_id).await?;

    state.store.remove_work(&creator_id, &work_id).await?;
    work::Entity::delete_by_id(record.id).exec(&state.db).await?;

    Ok(())
}

pub(crate) fn validate_id_field(raw: &str, field: &'static str) -> Result<String, AppError> {
    match ids::validate_id(raw) {
        Ok(v) => Ok(v.to_string()),
        Err(IdError::Required) => Err(AppError::IdRequired(field)),
        Err(IdError::Invalid) => Err(AppError::IdInvalid(field)),
    }
}

pub(crate) fn validate_key(creator_id: &str, work_id: &str) -> Result<(String, String), AppError> {
    Ok((
        validate_id_field(creator_id, "creator id")?,
        validate_id_field(work_id, "work id")?,
    ))
}

/// Look up the zero-or-one work record for a key. More than one row is an
/// internal invariant violation.
pub(crate) async fn find_work<C: ConnectionTrait>(
    db: &C,
    creator_id: &str,
    work_id: &str,
) -> Result<Option<work::Model>, AppError> {
    let mut rows = work::Entity::find()
        .filter(work::Column::CreatorId.eq(creator_id))
        .filter(work::Column::WorkId.eq(work_id))
        .all(db)
        .await?;

    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        _ => Err(AppError::MultipleWorksFound {
            creator_id: creator_id.to_string(),
            work_id: work_id.to_string(),
        }),
    }
}

/// Look up a work and require the requester to own it.
pub(crate) async fn find_owned<C: ConnectionTrait>(
    db: &C,
    creator_id: &str,
    work_id: &str,
    requester_id: i32,
) -> Result<work::Model, AppError> {
    let record = find_work(db, creator_id, work_id)
        .await?
        .ok_or(AppError::WorkNotFound)?;
    if record.owner_id != requester_id {
        return Err(AppError::WorkDifferentOwner);
    }
    Ok(record)
}

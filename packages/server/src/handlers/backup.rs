use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::work::{BackupListResponse, BackupResponse, WorkResponse};
use crate::services::{backup, lifecycle};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{creator_id}/{work_id}/backups",
    tag = "Backups",
    operation_id = "listBackups",
    summary = "List a work's backups",
    description = "Backups are returned in chain order, oldest first.",
    params(
        ("creator_id" = String, Path, description = "Creator id"),
        ("work_id" = String, Path, description = "Work id"),
    ),
    responses(
        (status = 200, description = "Backup chain", body = BackupListResponse),
        (status = 400, description = "Bad id (ID_REQUIRED, ID_INVALID)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (WORK_DIFFERENT_OWNER)", body = ErrorBody),
        (status = 404, description = "Work not found (WORK_NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(creator_id, work_id, user_id = auth_user.user_id))]
pub async fn list_backups(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((creator_id, work_id)): Path<(String, String)>,
) -> Result<Json<BackupListResponse>, AppError> {
    let (creator_id, work_id) = lifecycle::validate_key(&creator_id, &work_id)?;
    let record = lifecycle::find_owned(&state.db, &creator_id, &work_id, auth_user.user_id).await?;

    let entries = record.backup_entries();
    let total = entries.len() as u64;
    let backups = entries.into_iter().map(BackupResponse::from).collect();

    Ok(Json(BackupListResponse { backups, total }))
}

#[utoipa::path(
    post,
    path = "/{creator_id}/{work_id}/backups/{name}/restore",
    tag = "Backups",
    operation_id = "restoreBackup",
    summary = "Restore a backup into the active slot",
    description = "The current active content is preserved as a new backup before the named \
        backup takes its place, so no content is lost.",
    params(
        ("creator_id" = String, Path, description = "Creator id"),
        ("work_id" = String, Path, description = "Work id"),
        ("name" = String, Path, description = "Backup name (decimal digits)"),
    ),
    responses(
        (status = 200, description = "Work after the restore", body = WorkResponse),
        (status = 400, description = "Bad id or backup name (ID_REQUIRED, ID_INVALID)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (WORK_DIFFERENT_OWNER)", body = ErrorBody),
        (status = 404, description = "Work or backup not found (WORK_NOT_FOUND, BACKUP_NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(creator_id, work_id, name, user_id = auth_user.user_id))]
pub async fn restore_backup(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((creator_id, work_id, name)): Path<(String, String, String)>,
) -> Result<Json<WorkResponse>, AppError> {
    let model =
        backup::restore_backup(&state, auth_user.user_id, &creator_id, &work_id, &name).await?;

    Ok(Json(WorkResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/{creator_id}/{work_id}/backups/{name}",
    tag = "Backups",
    operation_id = "deleteBackup",
    summary = "Permanently delete a backup",
    params(
        ("creator_id" = String, Path, description = "Creator id"),
        ("work_id" = String, Path, description = "Work id"),
        ("name" = String, Path, description = "Backup name (decimal digits)"),
    ),
    responses(
        (status = 200, description = "Work after the deletion", body = WorkResponse),
        (status = 400, description = "Bad id or backup name (ID_REQUIRED, ID_INVALID)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (WORK_DIFFERENT_OWNER)", body = ErrorBody),
        (status = 404, description = "Work or backup not found (WORK_NOT_FOUND, BACKUP_NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(creator_id, work_id, name, user_id = auth_user.user_id))]
pub async fn delete_backup(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((creator_id, work_id, name)): Path<(String, String, String)>,
) -> Result<Json<WorkResponse>, AppError> {
    let model =
        backup::delete_backup(&state, auth_user.user_id, &creator_id, &work_id, &name).await?;

    Ok(Json(WorkResponse::from(model)))
}

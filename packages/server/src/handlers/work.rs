use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sea_orm::*;
use tracing::instrument;

use crate::config::AppConfig;
use crate::entity::work;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::work::{RenameRequest, UploadResponse, WorkListResponse, WorkResponse};
use crate::services::{lifecycle, quota};
use crate::state::AppState;
use crate::utils::upload::stage_multipart;

pub fn upload_body_limit(config: &AppConfig) -> DefaultBodyLimit {
    // Slack over the per-file budget for multipart framing.
    let limit = config.storage.max_upload_size.saturating_add(1024 * 1024);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/{creator_id}/{work_id}",
    tag = "Works",
    operation_id = "uploadWork",
    summary = "Upload (create or overwrite) a work",
    description = "Multipart upload. `content` fields carry the work's file tree with relative \
        paths preserved; an optional `thumbnail` field carries one flat-named image. \
        Overwriting an existing work first moves its active content into a new numbered backup.",
    params(
        ("creator_id" = String, Path, description = "Creator id ([0-9a-z-]+)"),
        ("work_id" = String, Path, description = "Work id ([0-9a-z-]+)"),
    ),
    request_body(content_type = "multipart/form-data", description = "Work content upload"),
    responses(
        (status = 201, description = "Work stored", body = UploadResponse),
        (status = 400, description = "Bad id or empty upload (ID_REQUIRED, ID_INVALID, NO_FILES_UPLOADED, VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Creator id claimed by another user (CREATOR_ID_IN_USE)", body = ErrorBody),
        (status = 507, description = "Storage quota reached (STORAGE_FULL)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(creator_id, work_id, user_id = auth_user.user_id))]
pub async fn upload_work(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((creator_id, work_id)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let staged = stage_multipart(
        &state.store,
        &mut multipart,
        state.config.storage.max_upload_size,
    )
    .await?;

    let result = lifecycle::upload(&state, auth_user.user_id, &creator_id, &work_id, &staged).await;

    // Whatever is still parked in staging goes, success or not.
    staged.cleanup().await;

    let outcome = result?;
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            served_paths: outcome.served_paths,
            work: WorkResponse::from(outcome.work),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/{creator_id}/{work_id}/rename",
    tag = "Works",
    operation_id = "renameWork",
    summary = "Move a work to a new identity",
    description = "Moves the record, the active tree and the whole backup chain to \
        `(new_creator_id, new_work_id)`. Backups keep their names.",
    params(
        ("creator_id" = String, Path, description = "Current creator id"),
        ("work_id" = String, Path, description = "Current work id"),
    ),
    responses(
        (status = 200, description = "Work renamed", body = WorkResponse),
        (status = 400, description = "Bad id or no-op rename (ID_REQUIRED, ID_INVALID, RENAME_TO_SAME)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (WORK_DIFFERENT_OWNER)", body = ErrorBody),
        (status = 404, description = "Work not found (WORK_NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Target taken (RENAME_TO_EXISTING, CREATOR_ID_IN_USE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(creator_id, work_id, user_id = auth_user.user_id))]
pub async fn rename_work(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((creator_id, work_id)): Path<(String, String)>,
    AppJson(payload): AppJson<RenameRequest>,
) -> Result<Json<WorkResponse>, AppError> {
    let model = lifecycle::rename(
        &state,
        auth_user.user_id,
        &creator_id,
        &work_id,
        &payload.new_creator_id,
        &payload.new_work_id,
    )
    .await?;

    Ok(Json(WorkResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/{creator_id}/{work_id}",
    tag = "Works",
    operation_id = "deleteWork",
    summary = "Delete a work and all of its backups",
    params(
        ("creator_id" = String, Path, description = "Creator id"),
        ("work_id" = String, Path, description = "Work id"),
    ),
    responses(
        (status = 204, description = "Work deleted"),
        (status = 400, description = "Bad id (ID_REQUIRED, ID_INVALID)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (WORK_DIFFERENT_OWNER)", body = ErrorBody),
        (status = 404, description = "Work not found (WORK_NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(creator_id, work_id, user_id = auth_user.user_id))]
pub async fn delete_work(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((creator_id, work_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    lifecycle::delete(&state, auth_user.user_id, &creator_id, &work_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Works",
    operation_id = "listWorks",
    summary = "List every stored work (admin only)",
    responses(
        (status = 200, description = "All works plus the storage usage figure", body = WorkListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_works(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<WorkListResponse>, AppError> {
    auth_user.require_admin()?;

    let rows = work::Entity::find()
        .order_by_asc(work::Column::CreatorId)
        .order_by_asc(work::Column::WorkId)
        .all(&state.db)
        .await?;

    let usage_bytes = quota::usage_bytes(&state.db).await?;
    let total = rows.len() as u64;
    let works = rows.into_iter().map(WorkResponse::from).collect();

    Ok(Json(WorkListResponse {
        works,
        total,
        usage_bytes,
    }))
}

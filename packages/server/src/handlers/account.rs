use axum::{Json, extract::State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::account::{CreatorIdsResponse, SetDefaultCreatorIdRequest};
use crate::models::auth::MeResponse;
use crate::services::{lifecycle, ownership};
use crate::state::AppState;

#[utoipa::path(
    put,
    path = "/default-creator-id",
    tag = "Account",
    operation_id = "setDefaultCreatorId",
    summary = "Set or clear the account's default creator id",
    responses(
        (status = 200, description = "Updated account", body = MeResponse),
        (status = 400, description = "Invalid id (ID_INVALID)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn set_default_creator_id(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SetDefaultCreatorIdRequest>,
) -> Result<Json<MeResponse>, AppError> {
    let default = payload
        .creator_id
        .as_deref()
        .map(|raw| lifecycle::validate_id_field(raw, "creator id"))
        .transpose()?;

    let user = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    let mut active: user::ActiveModel = user.into();
    active.default_creator_id = Set(default);
    let updated = active.update(&state.db).await?;

    Ok(Json(MeResponse::from(updated)))
}

#[utoipa::path(
    post,
    path = "/creator-ids/cleanup",
    tag = "Account",
    operation_id = "cleanupCreatorIds",
    summary = "Release claimed creator ids that no longer back any work",
    description = "Drops every claimed creator id with no remaining owned work, \
        freeing it for other users. Safe to call repeatedly.",
    responses(
        (status = 200, description = "Remaining claimed creator ids", body = CreatorIdsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn cleanup_creator_ids(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<CreatorIdsResponse>, AppError> {
    let creator_ids = ownership::prune_unclaimed(&state.db, auth_user.user_id).await?;

    Ok(Json(CreatorIdsResponse { creator_ids }))
}

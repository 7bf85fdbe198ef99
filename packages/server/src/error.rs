use atelier_common::storage::StorageError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `ID_REQUIRED`,
    /// `ID_INVALID`, `STORAGE_FULL`, `CREATOR_ID_IN_USE`, `NO_FILES_UPLOADED`,
    /// `WORK_NOT_FOUND`, `WORK_DIFFERENT_OWNER`, `MULTIPLE_WORKS_FOUND`,
    /// `RENAME_TO_SAME`, `RENAME_TO_EXISTING`, `BACKUP_NOT_FOUND`,
    /// `TOKEN_MISSING`, `TOKEN_INVALID`, `INVALID_CREDENTIALS`,
    /// `PERMISSION_DENIED`, `USERNAME_TAKEN`, `INTERNAL_ERROR`.
    #[schema(example = "ID_INVALID")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Creator id may only contain 0-9, a-z and '-'")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// A required id was missing. Carries the field name.
    IdRequired(&'static str),
    /// An id failed the `[0-9a-z-]+` syntax rule. Carries the field name.
    IdInvalid(&'static str),
    /// The configured storage ceiling would be exceeded.
    StorageFull,
    /// The creator id is already claimed by a different user.
    CreatorIdInUse,
    /// No usable file survived field validation and filtering.
    NoFilesUploaded,
    WorkNotFound,
    /// The requester is not the owner of the work.
    WorkDifferentOwner,
    /// More than one record exists for one `(creator_id, work_id)` key.
    /// Internal invariant violation; never expected.
    MultipleWorksFound {
        creator_id: String,
        work_id: String,
    },
    RenameToSame,
    RenameToExisting,
    BackupNotFound,
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    UsernameTaken,
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::IdRequired(field) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "ID_REQUIRED",
                    message: format!("{field} is required"),
                },
            ),
            AppError::IdInvalid(field) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "ID_INVALID",
                    message: format!("{field} may only contain 0-9, a-z and '-'"),
                },
            ),
            AppError::StorageFull => (
                StatusCode::INSUFFICIENT_STORAGE,
                ErrorBody {
                    code: "STORAGE_FULL",
                    message: "Total storage limit reached; no further uploads accepted".into(),
                },
            ),
            AppError::CreatorIdInUse => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CREATOR_ID_IN_USE",
                    message: "This creator id is already used by another user".into(),
                },
            ),
            AppError::NoFilesUploaded => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "NO_FILES_UPLOADED",
                    message: "No usable files were uploaded".into(),
                },
            ),
            AppError::WorkNotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "WORK_NOT_FOUND",
                    message: "Work not found".into(),
                },
            ),
            AppError::WorkDifferentOwner => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "WORK_DIFFERENT_OWNER",
                    message: "This work belongs to another user".into(),
                },
            ),
            AppError::MultipleWorksFound {
                creator_id,
                work_id,
            } => {
                tracing::error!(%creator_id, %work_id, "duplicate work records for one key");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "MULTIPLE_WORKS_FOUND",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
            AppError::RenameToSame => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "RENAME_TO_SAME",
                    message: "New identity is identical to the current one".into(),
                },
            ),
            AppError::RenameToExisting => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "RENAME_TO_EXISTING",
                    message: "A work already exists under the target identity".into(),
                },
            ),
            AppError::BackupNotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "BACKUP_NOT_FOUND",
                    message: "Backup not found".into(),
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid username or password".into(),
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: "Insufficient permissions".into(),
                },
            ),
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "USERNAME_TAKEN",
                    message: "Username is already taken".into(),
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::BackupMissing { .. } => AppError::BackupNotFound,
            // The detail carries filesystem paths; log it here and surface a
            // generic fault to the caller.
            other => AppError::Internal(other.to_string()),
        }
    }
}

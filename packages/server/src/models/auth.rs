use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "correct-horse-battery")]
    pub password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    pub id: i32,
    pub username: String,
    pub role: String,
}

impl From<user::Model> for RegisterResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            role: u.role,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub id: i32,
    pub username: String,
    pub role: String,
    pub default_creator_id: Option<String>,
    pub creator_ids: Vec<String>,
    pub is_guest: bool,
}

impl From<user::Model> for MeResponse {
    fn from(u: user::Model) -> Self {
        let creator_ids = u.claimed_creator_ids();
        Self {
            id: u.id,
            username: u.username,
            role: u.role,
            default_creator_id: u.default_creator_id,
            creator_ids,
            is_guest: u.is_guest,
        }
    }
}

pub fn validate_register_request(req: &RegisterRequest) -> Result<(), AppError> {
    let username = req.username.trim();
    if username.is_empty() || username.chars().count() > 64 {
        return Err(AppError::Validation("Username must be 1-64 characters".into()));
    }
    if req.password.chars().count() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_login_request(req: &LoginRequest) -> Result<(), AppError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("Username and password are required".into()));
    }
    Ok(())
}

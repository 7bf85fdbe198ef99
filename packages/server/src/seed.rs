use sea_orm::*;
use tracing::info;

use crate::config::AppConfig;
use crate::entity::user;
use crate::utils::hash;

/// Seed the admin account named in the config, if any.
///
/// Runs on every startup; an existing account with that username is left
/// untouched so credential rotation happens through the usual channels.
pub async fn seed_admin(db: &DatabaseConnection, config: &AppConfig) -> anyhow::Result<()> {
    let (Some(username), Some(password)) = (
        config.auth.admin_username.as_deref(),
        config.auth.admin_password.as_deref(),
    ) else {
        return Ok(());
    };

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let hashed = hash::hash_password(password)?;

    let model = user::ActiveModel {
        username: Set(username.to_string()),
        password: Set(hashed),
        role: Set(user::ADMIN_ROLE.to_string()),
        creator_ids: Set(user::creator_ids_to_json(&[])),
        is_guest: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match model.insert(db).await {
        Ok(_) => {
            info!(username, "Seeded admin account");
            Ok(())
        }
        // Concurrent startup already inserted it.
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

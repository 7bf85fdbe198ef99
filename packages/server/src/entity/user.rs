use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role assigned to newly registered users.
pub const DEFAULT_ROLE: &str = "member";
/// Role that unlocks the admin browsing surface.
pub const ADMIN_ROLE: &str = "admin";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    pub password: String,
    pub role: String,

    /// Convenience default applied by clients when no creator id is given.
    pub default_creator_id: Option<String>,

    /// Creator ids this user has claimed through uploads, as a JSON array of
    /// strings. A given id should appear in at most one user's list at a
    /// time; enforced procedurally, not by the schema.
    #[sea_orm(column_type = "JsonBinary")]
    pub creator_ids: serde_json::Value,

    /// Marks accounts provisioned for visitors rather than registered
    /// members. Registration and seeding always create non-guest accounts.
    pub is_guest: bool,

    #[sea_orm(has_many)]
    pub works: HasMany<super::work::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Decode the claimed creator id list.
    pub fn claimed_creator_ids(&self) -> Vec<String> {
        serde_json::from_value(self.creator_ids.clone()).unwrap_or_default()
    }
}

/// Encode a claimed creator id list for storage.
pub fn creator_ids_to_json(ids: &[String]) -> serde_json::Value {
    serde_json::to_value(ids).unwrap_or_else(|_| serde_json::Value::Array(Vec::new()))
}

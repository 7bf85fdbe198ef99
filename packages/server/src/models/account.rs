use serde::{Deserialize, Serialize};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetDefaultCreatorIdRequest {
    /// New default, or null to clear it.
    #[schema(example = "acme")]
    pub creator_id: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CreatorIdsResponse {
    /// Creator ids currently claimed by the user.
    pub creator_ids: Vec<String>,
}

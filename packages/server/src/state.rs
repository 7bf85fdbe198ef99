use std::sync::Arc;

use atelier_common::storage::WorkStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::services::locks::WorkLocks;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub store: Arc<WorkStore>,
    pub locks: Arc<WorkLocks>,
}

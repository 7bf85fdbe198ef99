use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .nest("/works", work_routes(config))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn account_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::account::set_default_creator_id))
        .routes(routes!(handlers::account::cleanup_creator_ids))
}

fn work_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    // Upload and delete share a path; the raised body limit only matters for
    // the upload but is harmless on the body-less delete.
    let keyed = OpenApiRouter::new()
        .routes(routes!(
            handlers::work::upload_work,
            handlers::work::delete_work
        ))
        .layer(handlers::work::upload_body_limit(config));

    OpenApiRouter::new()
        .routes(routes!(handlers::work::list_works))
        .routes(routes!(handlers::work::rename_work))
        .routes(routes!(handlers::backup::list_backups))
        .routes(routes!(handlers::backup::restore_backup))
        .routes(routes!(handlers::backup::delete_backup))
        .merge(keyed)
}

mod v1;

use axum::Router;
use axum::routing::get;
use utoipa_axum::router::OpenApiRouter;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v1", v1::routes(config))
}

/// Routes outside the versioned API: uploaded media.
pub fn media_routes() -> Router<AppState> {
    Router::new().route(
        "/media/recipes/{file}",
        get(handlers::media::serve_recipe_image),
    )
}

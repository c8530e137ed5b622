use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/tags", tag_routes())
        .nest("/ingredients", ingredient_routes())
        .nest("/recipes", recipe_routes(config))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::users::list_users))
        .routes(routes!(handlers::users::me))
        .routes(routes!(handlers::users::set_password))
        .routes(routes!(handlers::users::list_subscriptions))
        .routes(routes!(handlers::users::get_user))
        .routes(routes!(
            handlers::users::subscribe,
            handlers::users::unsubscribe
        ))
}

fn tag_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::catalog::list_tags))
        .routes(routes!(handlers::catalog::get_tag))
}

fn ingredient_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::catalog::list_ingredients))
        .routes(routes!(handlers::catalog::get_ingredient))
}

fn recipe_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let writes = OpenApiRouter::new()
        .routes(routes!(
            handlers::recipes::list_recipes,
            handlers::recipes::create_recipe
        ))
        .routes(routes!(
            handlers::recipes::get_recipe,
            handlers::recipes::update_recipe,
            handlers::recipes::delete_recipe
        ))
        .layer(handlers::recipes::recipe_body_limit(&config.storage));

    let relations = OpenApiRouter::new()
        .routes(routes!(handlers::recipes::download_shopping_cart))
        .routes(routes!(
            handlers::recipes::add_favorite,
            handlers::recipes::remove_favorite
        ))
        .routes(routes!(
            handlers::recipes::add_to_cart,
            handlers::recipes::remove_from_cart
        ));

    writes.merge(relations)
}

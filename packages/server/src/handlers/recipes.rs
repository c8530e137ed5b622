use axum::{
    Json,
    extract::{DefaultBodyLimit, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;

use crate::config::StorageConfig;
use crate::entity::{
    favorite, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, tag,
};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, viewer_id};
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::recipe::{
    CreateRecipeRequest, RecipeListQuery, RecipeListResponse, RecipeResponse, RecipeRules,
    RecipeShortResponse, UpdateRecipeRequest, validate_recipe,
};
use crate::models::shared::{Page, Pagination, parse_flag};
use crate::models::shopping_list::{CartLine, aggregate, render_text};
use crate::state::AppState;
use crate::utils::recipe::{
    ensure_catalog_ids, find_recipe_for_update, project_recipe, project_recipes,
    replace_associations,
};
use crate::utils::relation::{self, RecipeList, find_recipe};

/// Body limit for recipe payloads: the largest accepted image, base64-encoded,
/// plus room for the remaining fields.
pub fn recipe_body_limit(storage: &StorageConfig) -> DefaultBodyLimit {
    let encoded = storage.max_image_size.div_ceil(3) * 4;
    DefaultBodyLimit::max(usize::try_from(encoded + 256 * 1024).unwrap_or(usize::MAX))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Recipes",
    operation_id = "listRecipes",
    summary = "List recipes",
    description = "Returns recipes newest first. Filters: `author` (user ID), `tags` (slug, repeatable; a recipe matches if it has any of them), `is_favorited` and `is_in_shopping_cart` (`1`/`true`). The two list flags only apply to authenticated callers and are ignored otherwise.",
    params(RecipeListQuery),
    responses(
        (status = 200, description = "List of recipes", body = RecipeListResponse),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_recipes(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RecipeListQuery>,
) -> Result<Json<RecipeListResponse>, AppError> {
    let page = Page::resolve(query.page, query.limit, state.config.recipes.page_size);
    let only_favorites = parse_flag(query.is_favorited.as_deref(), "is_favorited")?;
    let only_cart = parse_flag(query.is_in_shopping_cart.as_deref(), "is_in_shopping_cart")?;
    let viewer = viewer_id(auth_user.as_ref());

    let mut select = recipe::Entity::find();

    if let Some(author_id) = query.author {
        select = select.filter(recipe::Column::AuthorId.eq(author_id));
    }

    let slugs: Vec<String> = query
        .tags
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if !slugs.is_empty() {
        select = select.filter(
            recipe::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(recipe_tag::Column::RecipeId)
                    .from(recipe_tag::Entity)
                    .inner_join(
                        tag::Entity,
                        Expr::col((tag::Entity, tag::Column::Id))
                            .equals((recipe_tag::Entity, recipe_tag::Column::TagId)),
                    )
                    .and_where(Expr::col((tag::Entity, tag::Column::Slug)).is_in(slugs))
                    .to_owned(),
            ),
        );
    }

    if let Some(user_id) = viewer {
        if only_favorites {
            select = select.filter(
                recipe::Column::Id.in_subquery(
                    SeaQuery::select()
                        .column(favorite::Column::RecipeId)
                        .from(favorite::Entity)
                        .and_where(favorite::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            );
        }
        if only_cart {
            select = select.filter(
                recipe::Column::Id.in_subquery(
                    SeaQuery::select()
                        .column(shopping_cart::Column::RecipeId)
                        .from(shopping_cart::Entity)
                        .and_where(shopping_cart::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            );
        }
    }

    let total = select
        .clone()
        .paginate(&state.db, page.size)
        .num_items()
        .await?;

    let recipes = select
        .order_by_desc(recipe::Column::CreatedAt)
        .order_by_desc(recipe::Column::Id)
        .offset(Some(page.offset()?))
        .limit(Some(page.size))
        .all(&state.db)
        .await?;

    let data = project_recipes(&state.db, recipes, viewer).await?;

    Ok(Json(RecipeListResponse {
        data,
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Recipes",
    operation_id = "createRecipe",
    summary = "Create a recipe",
    description = "Creates a recipe authored by the caller. Validation order: cooking time, tags, ingredients, name, text, image. Every tag and ingredient ID must exist in the catalog.",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Unknown tag or ingredient (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRecipeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let rules = RecipeRules::from(&state.config.recipes);
    let valid = validate_recipe(payload.into(), &rules, true)?;
    let image = valid
        .image
        .as_ref()
        .ok_or_else(|| AppError::Internal("Validated recipe has no image".into()))?;

    let txn = state.db.begin().await?;

    ensure_catalog_ids(&txn, &valid).await?;
    let key = state.images.put(image).await?;

    let now = chrono::Utc::now();
    let new_recipe = recipe::ActiveModel {
        author_id: Set(auth_user.user_id),
        name: Set(valid.name.clone()),
        image: Set(key.file_name()),
        text: Set(valid.text.clone()),
        cooking_time: Set(valid.cooking_time),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let model = new_recipe.insert(&txn).await?;
    replace_associations(&txn, model.id, &valid).await?;

    txn.commit().await?;

    tracing::info!(recipe_id = model.id, author_id = auth_user.user_id, "Recipe created");
    let response = project_recipe(&state.db, model, Some(auth_user.user_id)).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Recipes",
    operation_id = "getRecipe",
    summary = "Get a recipe by ID",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 401, description = "Malformed token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_recipe(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RecipeResponse>, AppError> {
    let model = find_recipe(&state.db, id).await?;
    let response = project_recipe(&state.db, model, viewer_id(auth_user.as_ref())).await?;
    Ok(Json(response))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Recipes",
    operation_id = "updateRecipe",
    summary = "Update a recipe",
    description = "Replaces the recipe's fields, tags and ingredients. Tags and ingredients are replaced as whole sets, never merged. Omit `image` to keep the current one. Only the author may update a recipe.",
    params(("id" = i32, Path, description = "Recipe ID")),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Recipe, tag or ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn update_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRecipeRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    let rules = RecipeRules::from(&state.config.recipes);
    let valid = validate_recipe(payload.into(), &rules, false)?;

    let txn = state.db.begin().await?;

    let existing = find_recipe_for_update(&txn, id).await?;
    auth_user.require_owner(existing.author_id)?;
    ensure_catalog_ids(&txn, &valid).await?;

    let mut active: recipe::ActiveModel = existing.into();
    if let Some(ref image) = valid.image {
        let key = state.images.put(image).await?;
        active.image = Set(key.file_name());
    }
    active.name = Set(valid.name.clone());
    active.text = Set(valid.text.clone());
    active.cooking_time = Set(valid.cooking_time);
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    replace_associations(&txn, model.id, &valid).await?;

    txn.commit().await?;

    tracing::info!(recipe_id = model.id, "Recipe updated");
    let response = project_recipe(&state.db, model, Some(auth_user.user_id)).await?;
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Recipes",
    operation_id = "deleteRecipe",
    summary = "Delete a recipe",
    description = "Deletes a recipe together with its tag and ingredient links and every favorite and shopping cart entry that refers to it. Only the author may delete a recipe.",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn delete_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    let existing = find_recipe_for_update(&txn, id).await?;
    auth_user.require_owner(existing.author_id)?;

    favorite::Entity::delete_many()
        .filter(favorite::Column::RecipeId.eq(id))
        .exec(&txn)
        .await?;
    shopping_cart::Entity::delete_many()
        .filter(shopping_cart::Column::RecipeId.eq(id))
        .exec(&txn)
        .await?;
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(id))
        .exec(&txn)
        .await?;
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(id))
        .exec(&txn)
        .await?;
    recipe::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(recipe_id = id, "Recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/favorite",
    tag = "Favorites & Cart",
    operation_id = "addFavorite",
    summary = "Add a recipe to favorites",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added", body = RecipeShortResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already a favorite (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn add_favorite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let model = relation::add_recipe(&state.db, RecipeList::Favorites, auth_user.user_id, id).await?;
    Ok((StatusCode::CREATED, Json(RecipeShortResponse::from(model))))
}

#[utoipa::path(
    delete,
    path = "/{id}/favorite",
    tag = "Favorites & Cart",
    operation_id = "removeFavorite",
    summary = "Remove a recipe from favorites",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found or not a favorite (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn remove_favorite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    relation::remove_recipe(&state.db, RecipeList::Favorites, auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/shopping_cart",
    tag = "Favorites & Cart",
    operation_id = "addToShoppingCart",
    summary = "Add a recipe to the shopping cart",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added", body = RecipeShortResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already in the cart (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn add_to_cart(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let model =
        relation::add_recipe(&state.db, RecipeList::ShoppingCart, auth_user.user_id, id).await?;
    Ok((StatusCode::CREATED, Json(RecipeShortResponse::from(model))))
}

#[utoipa::path(
    delete,
    path = "/{id}/shopping_cart",
    tag = "Favorites & Cart",
    operation_id = "removeFromShoppingCart",
    summary = "Remove a recipe from the shopping cart",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found or not in the cart (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn remove_from_cart(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    relation::remove_recipe(&state.db, RecipeList::ShoppingCart, auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/download_shopping_cart",
    tag = "Favorites & Cart",
    operation_id = "downloadShoppingCart",
    summary = "Download the aggregated shopping list",
    description = "Sums ingredient amounts over every recipe in the caller's cart, per ingredient name and unit, and returns them as a plain-text attachment sorted by name.",
    responses(
        (status = 200, description = "Shopping list", content_type = "text/plain", body = String),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn download_shopping_cart(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let rows = recipe_ingredient::Entity::find()
        .filter(
            recipe_ingredient::Column::RecipeId.in_subquery(
                SeaQuery::select()
                    .column(shopping_cart::Column::RecipeId)
                    .from(shopping_cart::Entity)
                    .and_where(shopping_cart::Column::UserId.eq(auth_user.user_id))
                    .to_owned(),
            ),
        )
        .find_also_related(ingredient::Entity)
        .all(&state.db)
        .await?;

    let items = aggregate(rows.into_iter().filter_map(|(link, ing)| {
        ing.map(|i| CartLine {
            name: i.name,
            measurement_unit: i.measurement_unit,
            amount: link.amount,
        })
    }));

    tracing::info!(items = items.len(), "Shopping list generated");
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_list.txt\"",
            ),
        ],
        render_text(&items),
    ))
}

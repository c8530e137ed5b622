use axum::{
    Json,
    extract::{Path, State},
};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{ingredient, tag};
use crate::error::{AppError, ErrorBody};
use crate::extractors::query::AppQuery;
use crate::models::catalog::{IngredientListQuery, IngredientResponse, TagResponse};
use crate::models::shared::escape_like;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Catalog",
    operation_id = "listTags",
    summary = "List all tags",
    responses((status = 200, description = "All tags", body = Vec<TagResponse>)),
)]
#[instrument(skip(state))]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagResponse>>, AppError> {
    let tags = tag::Entity::find()
        .order_by_asc(tag::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(tags.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Catalog",
    operation_id = "getTag",
    summary = "Get a tag by ID",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag", body = TagResponse),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TagResponse>, AppError> {
    let model = tag::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Catalog",
    operation_id = "listIngredients",
    summary = "List or search ingredients",
    description = "Returns ingredients ordered by name. `name` filters by case-insensitive prefix.",
    params(IngredientListQuery),
    responses(
        (status = 200, description = "Matching ingredients", body = Vec<IngredientResponse>),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<IngredientListQuery>,
) -> Result<Json<Vec<IngredientResponse>>, AppError> {
    let mut select = ingredient::Entity::find();

    if let Some(ref name) = query.name {
        let term = escape_like(name.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(ingredient::Column::Name)))
                    .like(LikeExpr::new(format!("{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let data = select
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(data.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Catalog",
    operation_id = "getIngredient",
    summary = "Get an ingredient by ID",
    params(("id" = i32, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Ingredient", body = IngredientResponse),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<IngredientResponse>, AppError> {
    let model = ingredient::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient not found".into()))?;
    Ok(Json(model.into()))
}

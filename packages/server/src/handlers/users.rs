use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{subscription, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, viewer_id};
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::auth::{SetPasswordRequest, validate_password};
use crate::models::shared::{Page, Pagination, preview_limit};
use crate::models::user::{
    RecipesLimitQuery, SubscriptionListResponse, SubscriptionQuery, SubscriptionResponse,
    UserListQuery, UserListResponse, UserResponse,
};
use crate::state::AppState;
use crate::utils::hash;
use crate::utils::recipe::project_subscriptions;
use crate::utils::relation::{self, find_user, followed_authors};

/// The caller's account. A token can outlive its account.
async fn current_user<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
) -> Result<user::Model, AppError> {
    match find_user(db, auth_user.user_id).await {
        Err(AppError::NotFound(_)) => Err(AppError::TokenInvalid),
        other => other,
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List users",
    description = "Returns users ordered by ID. Authentication is optional; `is_subscribed` is false for anonymous callers.",
    params(UserListQuery),
    responses(
        (status = 200, description = "List of users", body = UserListResponse),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_users(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    let page = Page::resolve(query.page, query.limit, state.config.recipes.page_size);
    let select = user::Entity::find();

    let total = select
        .clone()
        .paginate(&state.db, page.size)
        .num_items()
        .await?;

    let users = select
        .order_by_asc(user::Column::Id)
        .offset(Some(page.offset()?))
        .limit(Some(page.size))
        .all(&state.db)
        .await?;

    let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
    let followed = followed_authors(&state.db, viewer_id(auth_user.as_ref()), &ids).await?;

    let data = users
        .into_iter()
        .map(|u| {
            let is_subscribed = followed.contains(&u.id);
            UserResponse::new(u, is_subscribed)
        })
        .collect();

    Ok(Json(UserListResponse {
        data,
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    operation_id = "getCurrentUser",
    summary = "Get the current user",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = current_user(&state.db, &auth_user).await?;
    Ok(Json(UserResponse::new(user, false)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user profile",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_user(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    let user = find_user(&state.db, id).await?;
    let followed = followed_authors(&state.db, viewer_id(auth_user.as_ref()), &[id]).await?;
    Ok(Json(UserResponse::new(user, followed.contains(&id))))
}

#[utoipa::path(
    post,
    path = "/set_password",
    tag = "Users",
    operation_id = "setPassword",
    summary = "Change the current user's password",
    request_body = SetPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Wrong current password or invalid new one (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn set_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_password(&payload.new_password, "new_password")?;

    let user = current_user(&state.db, &auth_user).await?;

    let is_valid = hash::verify_password(&payload.current_password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidField {
            field: "current_password",
            message: "Current password is incorrect".into(),
        });
    }

    let hash = hash::hash_password(&payload.new_password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let mut active: user::ActiveModel = user.into();
    active.password = Set(hash);
    active.update(&state.db).await?;

    tracing::info!(user_id = auth_user.user_id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/subscriptions",
    tag = "Subscriptions",
    operation_id = "listSubscriptions",
    summary = "List followed authors",
    description = "Returns the authors the caller follows, newest subscription first, each with a preview of their newest recipes (`recipes_limit`, default from configuration) and the total recipe count.",
    params(SubscriptionQuery),
    responses(
        (status = 200, description = "Followed authors", body = SubscriptionListResponse),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_subscriptions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SubscriptionQuery>,
) -> Result<Json<SubscriptionListResponse>, AppError> {
    let page = Page::resolve(
        query.page,
        query.limit,
        state.config.recipes.subscriptions_page_size,
    );
    let recipes_limit =
        preview_limit(query.recipes_limit, state.config.recipes.preview_limit);

    let select = subscription::Entity::find()
        .filter(subscription::Column::UserId.eq(auth_user.user_id));

    let total = select
        .clone()
        .paginate(&state.db, page.size)
        .num_items()
        .await?;

    let author_ids: Vec<i32> = select
        .select_only()
        .column(subscription::Column::AuthorId)
        .order_by_desc(subscription::Column::CreatedAt)
        .order_by_asc(subscription::Column::AuthorId)
        .offset(Some(page.offset()?))
        .limit(Some(page.size))
        .into_tuple()
        .all(&state.db)
        .await?;

    let mut authors = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids.iter().copied()))
        .all(&state.db)
        .await?;
    authors.sort_by_key(|a| author_ids.iter().position(|id| *id == a.id));

    let data = project_subscriptions(&state.db, authors, recipes_limit).await?;

    Ok(Json(SubscriptionListResponse {
        data,
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/{id}/subscribe",
    tag = "Subscriptions",
    operation_id = "subscribe",
    summary = "Follow an author",
    params(
        ("id" = i32, Path, description = "Author's user ID"),
        RecipesLimitQuery,
    ),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Author not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already subscribed (CONFLICT) or subscribing to yourself (SELF_SUBSCRIPTION)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id, id))]
pub async fn subscribe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppQuery(query): AppQuery<RecipesLimitQuery>,
) -> Result<impl IntoResponse, AppError> {
    let recipes_limit =
        preview_limit(query.recipes_limit, state.config.recipes.preview_limit);

    let author = relation::subscribe(&state.db, auth_user.user_id, id).await?;
    let mut projected = project_subscriptions(&state.db, vec![author], recipes_limit).await?;
    let entry = projected
        .pop()
        .ok_or_else(|| AppError::Internal("Subscription projection was empty".into()))?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    delete,
    path = "/{id}/subscribe",
    tag = "Subscriptions",
    operation_id = "unsubscribe",
    summary = "Stop following an author",
    params(("id" = i32, Path, description = "Author's user ID")),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Author not found or not subscribed (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Subscribing to yourself (SELF_SUBSCRIPTION)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn unsubscribe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    relation::unsubscribe(&state.db, auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

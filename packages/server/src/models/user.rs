use serde::{Deserialize, Serialize};

use super::recipe::RecipeShortResponse;
use super::shared::Pagination;
use crate::entity::user;

/// Public profile of a user, relative to the caller.
#[derive(Serialize, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "alice.cooks")]
    pub username: String,
    #[schema(example = "Alice")]
    pub first_name: String,
    #[schema(example = "Liddell")]
    pub last_name: String,
    /// Whether the caller follows this user. Always false for anonymous callers.
    pub is_subscribed: bool,
}

impl UserResponse {
    pub fn new(m: user::Model, is_subscribed: bool) -> Self {
        Self {
            id: m.id,
            email: m.email,
            username: m.username,
            first_name: m.first_name,
            last_name: m.last_name,
            is_subscribed,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Page number (1-based).
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
}

/// An author the caller follows, with a preview of their recipes.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub author: UserResponse,
    /// The author's newest recipes, at most `recipes_limit`.
    pub recipes: Vec<RecipeShortResponse>,
    /// Total number of recipes by the author.
    #[schema(example = 12)]
    pub recipes_count: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubscriptionListResponse {
    pub data: Vec<SubscriptionResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubscriptionQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Number of recipes to preview per author.
    pub recipes_limit: Option<u64>,
}

/// Query accepted by `POST /users/{id}/subscribe`.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipesLimitQuery {
    pub recipes_limit: Option<u64>,
}

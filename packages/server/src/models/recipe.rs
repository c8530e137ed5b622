use chrono::{DateTime, Utc};
use common::{DataUriError, DecodedImage, decode_data_uri};
use serde::{Deserialize, Serialize};

use super::catalog::TagResponse;
use super::shared::{Pagination, first_duplicate};
use super::user::UserResponse;
use crate::config::RecipeConfig;
use crate::error::AppError;

/// Largest value a cooking time or an amount may take.
pub const MAX_SMALL_INT: i32 = 32_767;

pub const MAX_NAME_LENGTH: usize = 200;

/// One `{id, amount}` entry of a recipe payload.
#[derive(Deserialize, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct IngredientAmountRequest {
    /// Ingredient ID from the catalog.
    #[schema(example = 17)]
    pub id: i32,
    #[schema(example = 200)]
    pub amount: i32,
}

/// Request body for creating a recipe.
#[derive(Deserialize, Clone, Debug, utoipa::ToSchema)]
pub struct CreateRecipeRequest {
    pub ingredients: Vec<IngredientAmountRequest>,
    /// Tag IDs.
    #[schema(example = json!([1, 2]))]
    pub tags: Vec<i32>,
    /// Data URI, `data:image/<type>;base64,<data>`.
    #[schema(example = "data:image/png;base64,iVBORw0KGgo...")]
    pub image: String,
    #[schema(example = "Buckwheat pancakes")]
    pub name: String,
    pub text: String,
    /// Cooking time in minutes.
    #[schema(example = 25)]
    pub cooking_time: i32,
}

/// Request body for updating a recipe. Tags and ingredients replace the
/// previous sets entirely; omitting `image` keeps the current one.
#[derive(Deserialize, Clone, Debug, utoipa::ToSchema)]
pub struct UpdateRecipeRequest {
    pub ingredients: Vec<IngredientAmountRequest>,
    pub tags: Vec<i32>,
    pub image: Option<String>,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

/// The fields shared by create and update, before validation.
#[derive(Clone, Debug)]
pub struct RecipeDraft {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub tags: Vec<i32>,
    pub ingredients: Vec<IngredientAmountRequest>,
}

impl From<CreateRecipeRequest> for RecipeDraft {
    fn from(r: CreateRecipeRequest) -> Self {
        Self {
            name: r.name,
            text: r.text,
            cooking_time: r.cooking_time,
            image: Some(r.image),
            tags: r.tags,
            ingredients: r.ingredients,
        }
    }
}

impl From<UpdateRecipeRequest> for RecipeDraft {
    fn from(r: UpdateRecipeRequest) -> Self {
        Self {
            name: r.name,
            text: r.text,
            cooking_time: r.cooking_time,
            image: r.image,
            tags: r.tags,
            ingredients: r.ingredients,
        }
    }
}

/// Numeric limits applied to recipe payloads.
#[derive(Clone, Copy, Debug)]
pub struct RecipeRules {
    pub min_cooking_time: i32,
    pub max_cooking_time: i32,
    pub min_amount: i32,
    pub max_amount: i32,
}

impl From<&RecipeConfig> for RecipeRules {
    fn from(c: &RecipeConfig) -> Self {
        Self {
            min_cooking_time: c.min_cooking_time,
            max_cooking_time: MAX_SMALL_INT,
            min_amount: c.min_ingredient_amount,
            max_amount: MAX_SMALL_INT,
        }
    }
}

/// A recipe payload that passed every rule that needs no database access.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidRecipe {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    /// `None` when an update keeps the stored image.
    pub image: Option<DecodedImage>,
    pub tag_ids: Vec<i32>,
    /// `(ingredient_id, amount)` pairs.
    pub ingredients: Vec<(i32, i32)>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RecipeError {
    #[error("Cooking time must be between {min} and {max} minutes")]
    InvalidCookingTime { min: i32, max: i32 },
    #[error("At least one tag is required")]
    EmptyTags,
    #[error("Duplicate tag {0}")]
    DuplicateTag(i32),
    #[error("At least one ingredient is required")]
    EmptyIngredients,
    #[error("Amount of ingredient {ingredient_id} must be between {min} and {max}")]
    InvalidAmount { ingredient_id: i32, min: i32, max: i32 },
    #[error("Duplicate ingredient {0}")]
    DuplicateIngredient(i32),
    #[error("Name must be 1-200 characters")]
    InvalidName,
    #[error("Text must not be empty")]
    EmptyText,
    #[error("Image is required")]
    MissingImage,
    #[error("{0}")]
    InvalidImage(#[from] DataUriError),
}

impl RecipeError {
    /// The request field this error is about.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidCookingTime { .. } => "cooking_time",
            Self::EmptyTags | Self::DuplicateTag(_) => "tags",
            Self::EmptyIngredients | Self::InvalidAmount { .. } | Self::DuplicateIngredient(_) => {
                "ingredients"
            }
            Self::InvalidName => "name",
            Self::EmptyText => "text",
            Self::MissingImage | Self::InvalidImage(_) => "image",
        }
    }
}

impl From<RecipeError> for AppError {
    fn from(err: RecipeError) -> Self {
        AppError::InvalidField {
            field: err.field(),
            message: err.to_string(),
        }
    }
}

/// Check a recipe payload: cooking time, then tags, then ingredients, then
/// the free-text fields and the image. Catalog lookups happen later, inside
/// the write transaction.
pub fn validate_recipe(
    draft: RecipeDraft,
    rules: &RecipeRules,
    require_image: bool,
) -> Result<ValidRecipe, RecipeError> {
    if !(rules.min_cooking_time..=rules.max_cooking_time).contains(&draft.cooking_time) {
        return Err(RecipeError::InvalidCookingTime {
            min: rules.min_cooking_time,
            max: rules.max_cooking_time,
        });
    }

    if draft.tags.is_empty() {
        return Err(RecipeError::EmptyTags);
    }
    if let Some(id) = first_duplicate(draft.tags.iter().copied()) {
        return Err(RecipeError::DuplicateTag(id));
    }

    if draft.ingredients.is_empty() {
        return Err(RecipeError::EmptyIngredients);
    }
    if let Some(bad) = draft
        .ingredients
        .iter()
        .find(|i| !(rules.min_amount..=rules.max_amount).contains(&i.amount))
    {
        return Err(RecipeError::InvalidAmount {
            ingredient_id: bad.id,
            min: rules.min_amount,
            max: rules.max_amount,
        });
    }
    if let Some(id) = first_duplicate(draft.ingredients.iter().map(|i| i.id)) {
        return Err(RecipeError::DuplicateIngredient(id));
    }

    let name = draft.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(RecipeError::InvalidName);
    }
    if draft.text.trim().is_empty() {
        return Err(RecipeError::EmptyText);
    }

    let image = match draft.image.as_deref().map(str::trim) {
        Some(uri) if !uri.is_empty() => Some(decode_data_uri(uri)?),
        _ if require_image => return Err(RecipeError::MissingImage),
        _ => None,
    };

    Ok(ValidRecipe {
        name: name.to_string(),
        text: draft.text,
        cooking_time: draft.cooking_time,
        image,
        tag_ids: draft.tags,
        ingredients: draft
            .ingredients
            .into_iter()
            .map(|i| (i.id, i.amount))
            .collect(),
    })
}

/// An ingredient line of a recipe, joined with the catalog.
#[derive(Serialize, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct RecipeIngredientResponse {
    #[schema(example = 17)]
    pub id: i32,
    #[schema(example = "flour")]
    pub name: String,
    #[schema(example = "g")]
    pub measurement_unit: String,
    #[schema(example = 200)]
    pub amount: i32,
}

#[derive(Serialize, Clone, Debug, utoipa::ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    /// Whether the caller has favorited this recipe. False for anonymous callers.
    pub is_favorited: bool,
    /// Whether the recipe is in the caller's shopping cart. False for anonymous callers.
    pub is_in_shopping_cart: bool,
    pub name: String,
    /// URL of the recipe image.
    #[schema(example = "/media/recipes/3f2a...e9.png")]
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,
}

/// Compact recipe form used in subscriptions and relation toggles.
#[derive(Serialize, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct RecipeShortResponse {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<crate::entity::recipe::Model> for RecipeShortResponse {
    fn from(m: crate::entity::recipe::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            image: image_url(&m.image),
            cooking_time: m.cooking_time,
        }
    }
}

/// Public URL of a stored recipe image.
pub fn image_url(file_name: &str) -> String {
    format!("/media/recipes/{file_name}")
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RecipeListResponse {
    pub data: Vec<RecipeResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipeListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Only recipes by this author.
    pub author: Option<i32>,
    /// Tag slugs; a recipe matches if it has any of them. Repeatable.
    #[serde(default)]
    pub tags: Vec<String>,
    /// `1` to list only the caller's favorites.
    pub is_favorited: Option<String>,
    /// `1` to list only recipes in the caller's shopping cart.
    pub is_in_shopping_cart: Option<String>,
}

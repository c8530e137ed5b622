use std::collections::{HashMap, HashSet};

use sea_orm::sea_query::LockType;
use sea_orm::*;

use crate::entity::{ingredient, recipe, recipe_ingredient, recipe_tag, tag, user};
use crate::error::AppError;
use crate::models::catalog::TagResponse;
use crate::models::recipe::{
    RecipeIngredientResponse, RecipeResponse, RecipeShortResponse, ValidRecipe, image_url,
};
use crate::models::user::{SubscriptionResponse, UserResponse};
use crate::utils::relation::{RecipeList, followed_authors, recipes_in_list};

pub async fn find_recipe_for_update<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<recipe::Model, AppError> {
    recipe::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".into()))
}

/// Every referenced tag and ingredient must exist in the catalog.
pub async fn ensure_catalog_ids<C: ConnectionTrait>(
    db: &C,
    valid: &ValidRecipe,
) -> Result<(), AppError> {
    let found: HashSet<i32> = tag::Entity::find()
        .filter(tag::Column::Id.is_in(valid.tag_ids.iter().copied()))
        .select_only()
        .column(tag::Column::Id)
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();
    if let Some(missing) = valid.tag_ids.iter().find(|id| !found.contains(id)) {
        return Err(AppError::NotFound(format!("Tag {missing} not found")));
    }

    let ingredient_ids: Vec<i32> = valid.ingredients.iter().map(|(id, _)| *id).collect();
    let found: HashSet<i32> = ingredient::Entity::find()
        .filter(ingredient::Column::Id.is_in(ingredient_ids.iter().copied()))
        .select_only()
        .column(ingredient::Column::Id)
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();
    if let Some(missing) = ingredient_ids.iter().find(|id| !found.contains(id)) {
        return Err(AppError::NotFound(format!("Ingredient {missing} not found")));
    }

    Ok(())
}

/// Replace the tag and ingredient sets of a recipe. Call inside the write
/// transaction so readers never see a partial set.
pub async fn replace_associations<C: ConnectionTrait>(
    txn: &C,
    recipe_id: i32,
    valid: &ValidRecipe,
) -> Result<(), DbErr> {
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(txn)
        .await?;
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(txn)
        .await?;

    recipe_tag::Entity::insert_many(valid.tag_ids.iter().map(|&tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(tag_id),
    }))
    .exec_without_returning(txn)
    .await?;

    recipe_ingredient::Entity::insert_many(valid.ingredients.iter().map(|&(ingredient_id, amount)| {
        recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(ingredient_id),
            amount: Set(amount),
        }
    }))
    .exec_without_returning(txn)
    .await?;

    Ok(())
}

/// Build full recipe representations for `viewer`, preserving input order.
///
/// Runs a fixed number of queries regardless of how many recipes are passed.
pub async fn project_recipes<C: ConnectionTrait>(
    db: &C,
    recipes: Vec<recipe::Model>,
    viewer: Option<i32>,
) -> Result<Vec<RecipeResponse>, AppError> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    let mut author_ids: Vec<i32> = recipes.iter().map(|r| r.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let tag_rows = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .find_also_related(tag::Entity)
        .all(db)
        .await?;

    let ingredient_rows = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .find_also_related(ingredient::Entity)
        .all(db)
        .await?;

    let authors: HashMap<i32, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let favorited = recipes_in_list(db, RecipeList::Favorites, viewer, &recipe_ids).await?;
    let in_cart = recipes_in_list(db, RecipeList::ShoppingCart, viewer, &recipe_ids).await?;
    let followed = followed_authors(db, viewer, &author_ids).await?;

    let mut tags_by_recipe: HashMap<i32, Vec<TagResponse>> = HashMap::new();
    for (link, t) in tag_rows {
        if let Some(t) = t {
            tags_by_recipe.entry(link.recipe_id).or_default().push(t.into());
        }
    }

    let mut ingredients_by_recipe: HashMap<i32, Vec<RecipeIngredientResponse>> = HashMap::new();
    for (link, i) in ingredient_rows {
        if let Some(i) = i {
            ingredients_by_recipe
                .entry(link.recipe_id)
                .or_default()
                .push(RecipeIngredientResponse {
                    id: i.id,
                    name: i.name,
                    measurement_unit: i.measurement_unit,
                    amount: link.amount,
                });
        }
    }

    recipes
        .into_iter()
        .map(|r| {
            let author = authors
                .get(&r.author_id)
                .cloned()
                .ok_or_else(|| AppError::Internal(format!("Author of recipe {} missing", r.id)))?;

            let mut tags = tags_by_recipe.remove(&r.id).unwrap_or_default();
            tags.sort_by_key(|t| t.id);
            let mut ingredients = ingredients_by_recipe.remove(&r.id).unwrap_or_default();
            ingredients.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

            Ok(RecipeResponse {
                id: r.id,
                tags,
                author: UserResponse::new(author, followed.contains(&r.author_id)),
                ingredients,
                is_favorited: favorited.contains(&r.id),
                is_in_shopping_cart: in_cart.contains(&r.id),
                name: r.name,
                image: image_url(&r.image),
                text: r.text,
                cooking_time: r.cooking_time,
                created_at: r.created_at,
            })
        })
        .collect()
}

pub async fn project_recipe<C: ConnectionTrait>(
    db: &C,
    recipe: recipe::Model,
    viewer: Option<i32>,
) -> Result<RecipeResponse, AppError> {
    project_recipes(db, vec![recipe], viewer)
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("Recipe projection was empty".into()))
}

/// Build subscription entries for authors the viewer follows, keeping the
/// order of `authors`. Each entry previews the author's newest
/// `recipes_limit` recipes and reports the total count.
pub async fn project_subscriptions<C: ConnectionTrait>(
    db: &C,
    authors: Vec<user::Model>,
    recipes_limit: u64,
) -> Result<Vec<SubscriptionResponse>, AppError> {
    if authors.is_empty() {
        return Ok(Vec::new());
    }
    let author_ids: Vec<i32> = authors.iter().map(|a| a.id).collect();

    let counts: HashMap<i32, i64> = recipe::Entity::find()
        .select_only()
        .column(recipe::Column::AuthorId)
        .column_as(recipe::Column::Id.count(), "recipes_count")
        .filter(recipe::Column::AuthorId.is_in(author_ids.iter().copied()))
        .group_by(recipe::Column::AuthorId)
        .into_tuple::<(i32, i64)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let mut out = Vec::with_capacity(authors.len());
    for author in authors {
        let recipes = if recipes_limit == 0 {
            Vec::new()
        } else {
            recipe::Entity::find()
                .filter(recipe::Column::AuthorId.eq(author.id))
                .order_by_desc(recipe::Column::CreatedAt)
                .order_by_desc(recipe::Column::Id)
                .limit(Some(recipes_limit))
                .all(db)
                .await?
                .into_iter()
                .map(RecipeShortResponse::from)
                .collect()
        };
        let recipes_count = std::cmp::Ord::max(counts.get(&author.id).copied().unwrap_or(0), 0) as u64;
        out.push(SubscriptionResponse {
            author: UserResponse::new(author, true),
            recipes,
            recipes_count,
        });
    }
    Ok(out)
}

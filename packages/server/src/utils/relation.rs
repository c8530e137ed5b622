//! Per-user join rows: favorites, shopping cart entries and subscriptions.
//!
//! Uniqueness of every `(user, target)` pair is enforced by composite primary
//! keys, so a concurrent duplicate insert surfaces as a unique-constraint
//! violation and is reported as `CONFLICT`.

use std::collections::HashSet;

use sea_orm::*;

use crate::entity::{favorite, recipe, shopping_cart, subscription, user};
use crate::error::AppError;

/// The two per-user recipe lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    fn label(self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::ShoppingCart => "shopping cart",
        }
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub async fn find_recipe<C: ConnectionTrait>(db: &C, id: i32) -> Result<recipe::Model, AppError> {
    recipe::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".into()))
}

pub async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Add a recipe to one of the caller's lists and return the recipe.
pub async fn add_recipe<C: ConnectionTrait>(
    db: &C,
    list: RecipeList,
    user_id: i32,
    recipe_id: i32,
) -> Result<recipe::Model, AppError> {
    let recipe = find_recipe(db, recipe_id).await?;
    let now = chrono::Utc::now();

    let inserted = match list {
        RecipeList::Favorites => favorite::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            created_at: Set(now),
        }
        .insert(db)
        .await
        .map(|_| ()),
        RecipeList::ShoppingCart => shopping_cart::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            created_at: Set(now),
        }
        .insert(db)
        .await
        .map(|_| ()),
    };

    match inserted {
        Ok(()) => {
            tracing::info!(user_id, recipe_id, list = list.label(), "Recipe added");
            Ok(recipe)
        }
        Err(e) if is_unique_violation(&e) => Err(AppError::Conflict(format!(
            "Recipe is already in {}",
            list.label()
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Remove a recipe from one of the caller's lists.
pub async fn remove_recipe<C: ConnectionTrait>(
    db: &C,
    list: RecipeList,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), AppError> {
    find_recipe(db, recipe_id).await?;

    let deleted = match list {
        RecipeList::Favorites => {
            favorite::Entity::delete_by_id((user_id, recipe_id))
                .exec(db)
                .await?
                .rows_affected
        }
        RecipeList::ShoppingCart => {
            shopping_cart::Entity::delete_by_id((user_id, recipe_id))
                .exec(db)
                .await?
                .rows_affected
        }
    };

    if deleted == 0 {
        return Err(AppError::NotFound(format!(
            "Recipe is not in {}",
            list.label()
        )));
    }
    tracing::info!(user_id, recipe_id, list = list.label(), "Recipe removed");
    Ok(())
}

/// Follow an author and return the author.
///
/// The author must exist; following yourself is always rejected, before any
/// uniqueness check.
pub async fn subscribe<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    author_id: i32,
) -> Result<user::Model, AppError> {
    let author = find_user(db, author_id).await?;
    if user_id == author_id {
        return Err(AppError::SelfSubscription);
    }

    let row = subscription::ActiveModel {
        user_id: Set(user_id),
        author_id: Set(author_id),
        created_at: Set(chrono::Utc::now()),
    };

    match row.insert(db).await {
        Ok(_) => {
            tracing::info!(user_id, author_id, "Subscribed");
            Ok(author)
        }
        Err(e) if is_unique_violation(&e) => {
            Err(AppError::Conflict("Already subscribed to this author".into()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn unsubscribe<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    author_id: i32,
) -> Result<(), AppError> {
    find_user(db, author_id).await?;
    if user_id == author_id {
        return Err(AppError::SelfSubscription);
    }

    let res = subscription::Entity::delete_by_id((user_id, author_id))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(AppError::NotFound("Not subscribed to this author".into()));
    }
    tracing::info!(user_id, author_id, "Unsubscribed");
    Ok(())
}

/// Which of `recipe_ids` are in the viewer's list. Anonymous viewers get an
/// empty set without touching the database.
pub async fn recipes_in_list<C: ConnectionTrait>(
    db: &C,
    list: RecipeList,
    viewer: Option<i32>,
    recipe_ids: &[i32],
) -> Result<HashSet<i32>, DbErr> {
    let Some(user_id) = viewer else {
        return Ok(HashSet::new());
    };
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let ids: Vec<i32> = match list {
        RecipeList::Favorites => {
            favorite::Entity::find()
                .filter(favorite::Column::UserId.eq(user_id))
                .filter(favorite::Column::RecipeId.is_in(recipe_ids.iter().copied()))
                .select_only()
                .column(favorite::Column::RecipeId)
                .into_tuple()
                .all(db)
                .await?
        }
        RecipeList::ShoppingCart => {
            shopping_cart::Entity::find()
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .filter(shopping_cart::Column::RecipeId.is_in(recipe_ids.iter().copied()))
                .select_only()
                .column(shopping_cart::Column::RecipeId)
                .into_tuple()
                .all(db)
                .await?
        }
    };
    Ok(ids.into_iter().collect())
}

/// Which of `author_ids` the viewer follows. Anonymous viewers follow nobody.
pub async fn followed_authors<C: ConnectionTrait>(
    db: &C,
    viewer: Option<i32>,
    author_ids: &[i32],
) -> Result<HashSet<i32>, DbErr> {
    let Some(user_id) = viewer else {
        return Ok(HashSet::new());
    };
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let ids: Vec<i32> = subscription::Entity::find()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::AuthorId.is_in(author_ids.iter().copied()))
        .select_only()
        .column(subscription::Column::AuthorId)
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect())
}

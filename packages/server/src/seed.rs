use std::path::Path;

use anyhow::{Context, Result};
use sea_orm::sea_query::{Index, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::CatalogConfig;
use crate::entity::{favorite, ingredient, recipe, shopping_cart, subscription, tag};
use crate::models::catalog::{IngredientSeed, TagSeed};

async fn read_seed_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read catalog file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse catalog file {}", path.display()))
}

/// Load the configured catalog files. Rows that already exist are skipped, so
/// this is safe to run on every startup.
pub async fn seed_catalog(db: &DatabaseConnection, catalog: &CatalogConfig) -> Result<()> {
    if let Some(ref path) = catalog.ingredients_file {
        let rows: Vec<IngredientSeed> = read_seed_file(path).await?;
        let inserted = seed_ingredients(db, rows).await?;
        info!(inserted, file = %path.display(), "Seeded ingredients");
    }

    if let Some(ref path) = catalog.tags_file {
        let rows: Vec<TagSeed> = read_seed_file(path).await?;
        let inserted = seed_tags(db, rows).await?;
        info!(inserted, file = %path.display(), "Seeded tags");
    }

    Ok(())
}

/// Insert ingredients, skipping existing `(name, measurement_unit)` pairs.
/// Returns the number of new rows.
pub async fn seed_ingredients<C: ConnectionTrait>(
    db: &C,
    rows: Vec<IngredientSeed>,
) -> Result<u32, DbErr> {
    let mut inserted = 0u32;
    for row in rows {
        let model = ingredient::ActiveModel {
            name: Set(row.name.trim().to_string()),
            measurement_unit: Set(row.measurement_unit.trim().to_string()),
            ..Default::default()
        };

        let result = ingredient::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    ingredient::Column::Name,
                    ingredient::Column::MeasurementUnit,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) if n > 0 => inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(inserted)
}

/// Insert tags. A tag clashing with an existing one on name, color or slug is
/// skipped.
pub async fn seed_tags<C: ConnectionTrait>(db: &C, rows: Vec<TagSeed>) -> Result<u32, DbErr> {
    let mut inserted = 0u32;
    for row in rows {
        let model = tag::ActiveModel {
            name: Set(row.name),
            color: Set(row.color),
            slug: Set(row.slug),
            ..Default::default()
        };

        let result = tag::Entity::insert(model)
            .on_conflict(OnConflict::new().do_nothing().to_owned())
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) if n > 0 => inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(inserted)
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let statements = [
        // Author filter and subscription previews: newest recipes of one author.
        Index::create()
            .if_not_exists()
            .name("idx_recipe_author_created")
            .table(recipe::Entity)
            .col(recipe::Column::AuthorId)
            .col(recipe::Column::CreatedAt)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_recipe_created")
            .table(recipe::Entity)
            .col(recipe::Column::CreatedAt)
            .to_owned(),
        // Primary keys lead with user_id; deleting a recipe looks rows up by recipe.
        Index::create()
            .if_not_exists()
            .name("idx_favorite_recipe")
            .table(favorite::Entity)
            .col(favorite::Column::RecipeId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_shopping_cart_recipe")
            .table(shopping_cart::Entity)
            .col(shopping_cart::Column::RecipeId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_subscription_user_created")
            .table(subscription::Entity)
            .col(subscription::Column::UserId)
            .col(subscription::Column::CreatedAt)
            .to_owned(),
    ];

    for stmt in statements {
        let sql = stmt.to_string(PostgresQueryBuilder);
        match db.execute_unprepared(&sql).await {
            Ok(_) => tracing::debug!("Ensured index: {}", sql),
            Err(e) => tracing::warn!("Failed to create index ({}): {}", sql, e),
        }
    }
    info!("Ensured recipe and relation indexes");

    Ok(())
}

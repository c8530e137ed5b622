use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ingredient")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "ingredient_name_unit")]
    pub name: String,
    #[sea_orm(unique_key = "ingredient_name_unit")]
    pub measurement_unit: String,

    #[sea_orm(has_many, via = "recipe_ingredient")]
    pub recipes: HasMany<super::recipe::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

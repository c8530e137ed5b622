use serde::{Deserialize, Serialize};

use crate::entity::{ingredient, tag};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct TagResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Breakfast")]
    pub name: String,
    #[schema(example = "#E26C2D")]
    pub color: String,
    #[schema(example = "breakfast")]
    pub slug: String,
}

impl From<tag::Model> for TagResponse {
    fn from(m: tag::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            color: m.color,
            slug: m.slug,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct IngredientResponse {
    #[schema(example = 17)]
    pub id: i32,
    #[schema(example = "flour")]
    pub name: String,
    #[schema(example = "g")]
    pub measurement_unit: String,
}

impl From<ingredient::Model> for IngredientResponse {
    fn from(m: ingredient::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            measurement_unit: m.measurement_unit,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IngredientListQuery {
    /// Case-insensitive name prefix.
    pub name: Option<String>,
}

/// One row of a catalog seed file.
#[derive(Deserialize, Debug)]
pub struct IngredientSeed {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Deserialize, Debug)]
pub struct TagSeed {
    pub name: String,
    pub color: String,
    pub slug: String,
}

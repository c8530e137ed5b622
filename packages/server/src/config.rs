use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of issued tokens, in days.
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
}

fn default_token_ttl_days() -> i64 {
    7
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding uploaded recipe images.
    pub images_dir: PathBuf,
    /// Largest accepted decoded image, in bytes.
    pub max_image_size: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("./media/recipes"),
            max_image_size: 5 * 1024 * 1024,
        }
    }
}

/// Business limits for recipes and list sizes.
#[derive(Debug, Deserialize, Clone)]
pub struct RecipeConfig {
    pub min_cooking_time: i32,
    pub min_ingredient_amount: i32,
    /// Default page size for recipe and user lists.
    pub page_size: u64,
    /// Default page size for the subscriptions list.
    pub subscriptions_page_size: u64,
    /// Recipes shown per author in subscription responses when
    /// `recipes_limit` is not given.
    pub preview_limit: u64,
}

impl Default for RecipeConfig {
    fn default() -> Self {
        Self {
            min_cooking_time: 1,
            min_ingredient_amount: 1,
            page_size: 6,
            subscriptions_page_size: 3,
            preview_limit: 3,
        }
    }
}

/// Optional JSON files loaded into the tag and ingredient catalog on startup.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    pub ingredients_file: Option<PathBuf>,
    pub tags_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub recipes: RecipeConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("storage.images_dir", "./media/recipes")?
            .set_default("storage.max_image_size", 5 * 1024 * 1024)?
            .set_default("recipes.min_cooking_time", 1)?
            .set_default("recipes.min_ingredient_amount", 1)?
            .set_default("recipes.page_size", 6)?
            .set_default("recipes.subscriptions_page_size", 3)?
            .set_default("recipes.preview_limit", 3)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., LARDER__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("LARDER").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

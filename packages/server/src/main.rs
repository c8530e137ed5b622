use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderValue, Method, header};
use common::storage::filesystem::FilesystemMediaStore;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use larder_server::config::{AppConfig, CorsConfig};
use larder_server::state::AppState;
use larder_server::{build_router, database, seed};

fn cors_layer(cors: &CorsConfig) -> anyhow::Result<CorsLayer> {
    let origins = cors
        .allow_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin '{o}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(cors.max_age)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = database::init_db(&config.database.url, config.database.max_connections)
        .await
        .context("failed to connect to the database")?;
    seed::ensure_indexes(&db).await?;
    seed::seed_catalog(&db, &config.catalog).await?;

    let images = FilesystemMediaStore::new(
        config.storage.images_dir.clone(),
        config.storage.max_image_size,
    )
    .await
    .with_context(|| {
        format!(
            "failed to open image store at {}",
            config.storage.images_dir.display()
        )
    })?;

    let cors = cors_layer(&config.server.cors)?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState {
        db,
        config,
        images: Arc::new(images),
    };
    let app = build_router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use common::storage::MediaKey;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Serve a stored recipe image. File names are content hashes, so responses
/// can be cached indefinitely; the key's format gives the content type.
#[instrument(skip(state))]
pub async fn serve_recipe_image(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let key: MediaKey = file.parse()?;
    let content = state.images.get(&key).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, key.format().mime_type())
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from(content))
        .map_err(|e| AppError::Internal(e.to_string()))
}

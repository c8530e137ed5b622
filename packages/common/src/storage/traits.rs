use async_trait::async_trait;

use super::error::StorageError;
use super::key::MediaKey;
use crate::image::DecodedImage;

/// Content-addressed storage for uploaded images.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store an image and return its key. Storing identical bytes twice is a no-op.
    async fn put(&self, image: &DecodedImage) -> Result<MediaKey, StorageError>;

    /// Read the full contents of a stored image.
    async fn get(&self, key: &MediaKey) -> Result<Vec<u8>, StorageError>;
}

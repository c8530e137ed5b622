use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::key::MediaKey;
use super::traits::MediaStore;
use crate::image::DecodedImage;

/// Filesystem-backed image store.
///
/// Files live at `{base_path}/{2 hex chars}/{file name}`; writes go through a
/// temp file and a rename so readers never observe partial images.
pub struct FilesystemMediaStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemMediaStore {
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn media_path(&self, key: &MediaKey) -> PathBuf {
        self.base_path
            .join(key.shard_prefix())
            .join(key.file_name())
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl MediaStore for FilesystemMediaStore {
    async fn put(&self, image: &DecodedImage) -> Result<MediaKey, StorageError> {
        let size = image.bytes.len() as u64;
        if size > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: size,
                limit: self.max_size,
            });
        }

        let key = MediaKey::compute(&image.bytes, image.format);
        let path = self.media_path(&key);
        if fs::try_exists(&path).await? {
            return Ok(key);
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, &image.bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(key = %key, size, "Stored image");
        Ok(key)
    }

    async fn get(&self, key: &MediaKey) -> Result<Vec<u8>, StorageError> {
        match fs::read(self.media_path(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.file_name()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

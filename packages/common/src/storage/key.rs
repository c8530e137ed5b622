use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use super::error::StorageError;
use crate::image::ImageFormat;

/// Content address of a stored image: SHA-256 of the bytes plus the format.
///
/// Rendered as `<64 hex chars>.<ext>`, which is both the stored column value
/// and the public file name under `/media/recipes/`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaKey {
    digest: [u8; 32],
    format: ImageFormat,
}

impl MediaKey {
    pub fn compute(data: &[u8], format: ImageFormat) -> Self {
        Self {
            digest: Sha256::digest(data).into(),
            format,
        }
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.digest)
    }

    /// First byte of the digest, used as the shard directory.
    pub fn shard_prefix(&self) -> String {
        hex::encode(&self.digest[..1])
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.to_hex(), self.format.extension())
    }
}

impl FromStr for MediaKey {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hex_part, ext) = s
            .rsplit_once('.')
            .ok_or_else(|| StorageError::InvalidKey(format!("missing extension in '{s}'")))?;
        let format = ImageFormat::from_extension(ext)
            .ok_or_else(|| StorageError::InvalidKey(format!("unknown extension '{ext}'")))?;
        if hex_part.len() != 64 {
            return Err(StorageError::InvalidKey(format!(
                "expected 64 hex characters, got {}",
                hex_part.len()
            )));
        }
        let bytes = hex::decode(hex_part)
            .map_err(|e| StorageError::InvalidKey(format!("invalid hex: {e}")))?;
        let digest: [u8; 32] = bytes
            .try_into()
            .map_err(|_| StorageError::InvalidKey("decoded to wrong length".into()))?;
        Ok(Self { digest, format })
    }
}

impl fmt::Debug for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MediaKey({})", self.file_name())
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

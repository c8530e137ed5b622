use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Image formats accepted for recipe pictures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    /// Parse the subtype of an `image/<subtype>` media type or a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Canonical file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Gif => Some(Self::Gif),
            image::ImageFormat::WebP => Some(Self::Webp),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// An image decoded from a data URI, with its format confirmed by magic bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataUriError {
    #[error("image must be a data URI of the form data:image/<type>;base64,<data>")]
    Malformed,
    #[error("unsupported image type '{0}'")]
    UnsupportedType(String),
    #[error("image data is not valid base64: {0}")]
    InvalidBase64(String),
    #[error("image data is empty")]
    Empty,
    #[error("image data is not a recognizable {declared} image")]
    ContentMismatch { declared: ImageFormat },
}

/// Decode a `data:image/<ext>;base64,<payload>` string.
///
/// The declared type must be supported and must agree with what the decoded
/// bytes actually contain.
pub fn decode_data_uri(input: &str) -> Result<DecodedImage, DataUriError> {
    let rest = input
        .trim()
        .strip_prefix("data:image/")
        .ok_or(DataUriError::Malformed)?;
    let (media, payload) = rest.split_once(',').ok_or(DataUriError::Malformed)?;
    let subtype = media
        .strip_suffix(";base64")
        .ok_or(DataUriError::Malformed)?;

    let declared = ImageFormat::from_extension(subtype)
        .ok_or_else(|| DataUriError::UnsupportedType(subtype.to_string()))?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| DataUriError::InvalidBase64(e.to_string()))?;
    if bytes.is_empty() {
        return Err(DataUriError::Empty);
    }

    match ImageFormat::sniff(&bytes) {
        Some(actual) if actual == declared => Ok(DecodedImage {
            format: declared,
            bytes,
        }),
        _ => Err(DataUriError::ContentMismatch { declared }),
    }
}

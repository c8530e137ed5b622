pub mod image;
pub mod storage;

pub use image::{DataUriError, DecodedImage, ImageFormat, decode_data_uri};

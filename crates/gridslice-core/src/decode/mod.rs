//! Loading of the single source image.
//!
//! This module provides:
//! - MIME type validation for the uploaded file
//! - Decoding of any supported format (PNG, JPEG, WebP, GIF, BMP) to RGBA
//! - EXIF orientation correction
//!
//! # Examples
//!
//! ```ignore
//! use gridslice_core::decode::{decode_image, validate_mime};
//!
//! validate_mime("image/jpeg")?;
//! let image = decode_image(&std::fs::read("photo.jpg")?)?;
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod load;
mod types;

pub use load::{decode_image, validate_mime};
pub use types::{DecodeError, Orientation, SourceImage};

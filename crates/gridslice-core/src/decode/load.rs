//! Decoding of the user-supplied file with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageError, ImageReader};

use super::{DecodeError, Orientation, SourceImage};

/// MIME prefix every accepted upload must carry.
const IMAGE_MIME_PREFIX: &str = "image/";

/// Reject anything whose MIME type is not an image type.
///
/// This runs before any bytes are decoded so an invalid upload never touches
/// session state.
pub fn validate_mime(mime: &str) -> Result<(), DecodeError> {
    if mime.starts_with(IMAGE_MIME_PREFIX) {
        Ok(())
    } else {
        Err(DecodeError::InvalidFileType {
            mime: mime.to_string(),
        })
    }
}

/// Decode image bytes into an RGBA [`SourceImage`], applying EXIF orientation.
///
/// The container format is guessed from the content, so the file extension
/// does not matter. Orientation is applied the way browsers apply it when
/// drawing an `<img>`, which keeps slices consistent with the preview.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format is not recognized.
/// Returns `DecodeError::CorruptedFile` if the data is damaged.
/// Returns `DecodeError::EmptyImage` for zero-sized images.
pub fn decode_image(bytes: &[u8]) -> Result<SourceImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }

    let orientation = extract_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader.decode().map_err(|e| match e {
        ImageError::Unsupported(_) => DecodeError::InvalidFormat,
        other => DecodeError::CorruptedFile(other.to_string()),
    })?;

    let rgba = apply_orientation(img, orientation).into_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage { width, height });
    }

    log::info!("Decoded {}x{} source image ({:?})", width, height, orientation);
    Ok(SourceImage::from_rgba_image(rgba))
}

/// Extract EXIF orientation from the file.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

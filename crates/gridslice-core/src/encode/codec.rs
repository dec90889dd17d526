//! Slice encoding for export.
//!
//! Every exported cell is an RGBA buffer. PNG and WebP keep the alpha channel;
//! JPEG has none, so transparent areas (the parts of a cell that fall outside
//! the source image) are composited onto black, matching what a browser
//! canvas does for `image/jpeg`.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

/// Errors that can occur while encoding a slice.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying encoder failed
    #[error("{format} encoding failed: {reason}")]
    EncodingFailed { format: &'static str, reason: String },
}

/// Output image format of the exported slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossless RGBA
    #[default]
    Png,
    /// Lossy, no alpha
    #[serde(rename = "jpg")]
    Jpeg,
    /// WebP (lossless encoder)
    Webp,
}

impl ExportFormat {
    /// File extension used in slice names.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Webp => "webp",
        }
    }

    /// Parse a format name as used by the host UI ("png", "jpg", "webp").
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "png" => Some(ExportFormat::Png),
            "jpg" | "jpeg" => Some(ExportFormat::Jpeg),
            "webp" => Some(ExportFormat::Webp),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG",
            ExportFormat::Jpeg => "JPEG",
            ExportFormat::Webp => "WebP",
        }
    }
}

/// Encode RGBA pixel data in the requested format.
///
/// # Arguments
///
/// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `format` - Output format
/// * `quality` - Quality for lossy formats (1-100); ignored by PNG and WebP
pub fn encode_rgba(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: ExportFormat,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 4;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let mut buffer = Cursor::new(Vec::new());
    let failed = |e: image::ImageError| EncodeError::EncodingFailed {
        format: format.label(),
        reason: e.to_string(),
    };

    match format {
        ExportFormat::Png => PngEncoder::new(&mut buffer)
            .write_image(pixels, width, height, ExtendedColorType::Rgba8)
            .map_err(failed)?,
        ExportFormat::Jpeg => {
            let rgb = flatten_onto_black(pixels);
            JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
                .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
                .map_err(failed)?
        }
        ExportFormat::Webp => WebPEncoder::new_lossless(&mut buffer)
            .write_image(pixels, width, height, ExtendedColorType::Rgba8)
            .map_err(failed)?,
    }

    Ok(buffer.into_inner())
}

/// Drop the alpha channel by compositing over opaque black.
fn flatten_onto_black(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = px[3] as u32;
        rgb.push(((px[0] as u32 * a + 127) / 255) as u8);
        rgb.push(((px[1] as u32 * a + 127) / 255) as u8);
        rgb.push(((px[2] as u32 * a + 127) / 255) as u8);
    }
    rgb
}


// ============================================================================
// Property-Based Tests
// ============================================================================

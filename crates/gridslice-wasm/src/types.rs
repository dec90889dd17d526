//! WASM-compatible wrapper types.

use gridslice_core::render::RasterSurface;
use wasm_bindgen::prelude::*;

/// A rasterized preview frame for JavaScript.
///
/// Pixels are RGBA, row-major, ready for `new ImageData(pixels, width)`.
/// Calling `pixels()` copies the buffer out of WASM memory.
#[wasm_bindgen]
pub struct JsRasterFrame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsRasterFrame {
    /// Frame width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte length of the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Copy of the RGBA pixel data as a `Uint8Array`.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsRasterFrame {
    pub(crate) fn from_surface(surface: RasterSurface) -> Self {
        Self {
            width: surface.width(),
            height: surface.height(),
            pixels: surface.into_pixels(),
        }
    }
}

/// Map any displayable error onto a JS string value.
pub(crate) fn js_error(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

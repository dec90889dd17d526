//! Pure geometry of the grid window.
//!
//! Everything in this module is side-effect free. Given the preview
//! container, the source image size, the current [`TransformState`] and the
//! [`GridConfig`], it derives:
//!
//! 1. The **frame**: the fixed grid window, letterboxed to the image aspect
//!    ratio and centered in the container.
//! 2. The **render rectangle**: where the whole source image is drawn after
//!    pan/zoom/stretch.
//! 3. One **cell rectangle** per grid cell, in source-image pixels.
//!
//! # Coordinate System
//!
//! - Frame and render rectangles are in preview-surface pixels, origin top-left
//! - Cell rectangles are in source-image pixels and may extend past the image
//!   bounds when the image is panned or zoomed out of the frame
//!
//! [`TransformState`]: crate::TransformState
//! [`GridConfig`]: crate::GridConfig

mod cell;
mod frame;

pub use cell::{
    compute_cell_source_rect, compute_render_rect, CellRect, GridCell, GridGeometry, RenderRect,
};
pub use frame::{compute_frame_rect, compute_frame_rect_with_fill, FrameRect, DEFAULT_FRAME_FILL};

/// Axis-aligned rectangle in floating-point pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether `(px, py)` lies inside the half-open rectangle.
    #[inline]
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

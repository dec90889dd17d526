//! GridSlice Core - grid-slicing transform engine
//!
//! This crate maps a freely transformed on-screen preview (pan, zoom, axis
//! stretch) onto exact pixel rectangles of the source image, one per grid
//! cell, and exports those cells at full source resolution.
//!
//! # Module Structure
//!
//! - `geometry` - Frame fitting, render rectangle and per-cell source rectangles
//! - `controller` - Interactive pan/zoom/scale and grid row/column state
//! - `render` - Live preview drawing and redraw coalescing
//! - `export` - Cell rasterization, encoding, naming and bundling
//! - `decode` - File type validation and image decoding
//! - `session` - One editing session tying the above together

pub mod config;
pub mod controller;
pub mod decode;
pub mod encode;
pub mod export;
pub mod geometry;
pub mod render;
pub mod session;

pub use config::{ConfigError, EditorConfig, ScaleRange};
pub use controller::{ScaleAxis, TransformController};
pub use decode::{decode_image, validate_mime, DecodeError, SourceImage};
pub use export::{export_grid, ExportBundle, ExportError, ExportFormat, ExportSettings};
pub use geometry::{
    compute_cell_source_rect, compute_frame_rect, compute_render_rect, CellRect, FrameRect,
    GridGeometry, RenderRect,
};
pub use session::{EditorSession, SessionError};

/// A point or offset in preview-surface pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Number of grid rows and columns laid over the frame.
///
/// Each row and column is one equal band across the full frame. The model
/// itself places no upper bound on either count; the controller clamps to
/// [`EditorConfig::max_rows`] / [`EditorConfig::max_cols`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GridConfig {
    /// Number of horizontal bands (>= 1)
    pub rows: u32,
    /// Number of vertical bands (>= 1)
    pub cols: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { rows: 3, cols: 6 }
    }
}

impl GridConfig {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Total number of cells (and exported files), or `None` if it does not
    /// fit in a `u32`.
    pub fn checked_cell_count(&self) -> Option<u32> {
        self.rows.checked_mul(self.cols)
    }

    /// Total number of cells, saturating at `u32::MAX`.
    pub fn cell_count(&self) -> u32 {
        self.rows.saturating_mul(self.cols)
    }

    /// 1-based, row-major file index of a cell.
    pub fn cell_index(&self, row: u32, col: u32) -> u32 {
        row.saturating_mul(self.cols)
            .saturating_add(col)
            .saturating_add(1)
    }

    /// At least one row and column, and a cell count that fits in a `u32`.
    pub fn is_valid(&self) -> bool {
        self.rows >= 1 && self.cols >= 1 && self.checked_cell_count().is_some()
    }
}

/// Pan/zoom/stretch applied to the image inside the fixed grid frame.
///
/// The rendered image is centered at `frame.center + position` and sized
/// `frame.size * scale_global * (scale_x, scale_y)`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransformState {
    /// Uniform zoom (0.1 to 5.0 by default)
    pub scale_global: f64,
    /// Horizontal stretch (0.5 to 2.0 by default)
    pub scale_x: f64,
    /// Vertical stretch (0.5 to 2.0 by default)
    pub scale_y: f64,
    /// Pan offset in preview-surface pixels (unbounded)
    pub position: Point,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            scale_global: 1.0,
            scale_x: 1.0,
            scale_y: 1.0,
            position: Point::default(),
        }
    }
}

impl TransformState {
    /// Check if this is the frame-fitted default view
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// All scales finite and strictly positive, position finite.
    pub fn is_valid(&self) -> bool {
        [self.scale_global, self.scale_x, self.scale_y]
            .iter()
            .all(|s| s.is_finite() && *s > 0.0)
            && self.position.is_finite()
    }

    /// Effective horizontal magnification relative to the frame.
    pub fn effective_scale_x(&self) -> f64 {
        self.scale_global * self.scale_x
    }

    /// Effective vertical magnification relative to the frame.
    pub fn effective_scale_y(&self) -> f64 {
        self.scale_global * self.scale_y
    }
}

//! Render rectangle and per-cell source rectangles.
//!
//! The mapping from preview pixels to source pixels is a per-axis scale:
//!
//! ```text
//! ratio_x     = source_w / draw_w
//! off_x       = (draw_w - frame.width) / 2 - position.x
//! src_frame_x = off_x * ratio_x
//! src_frame_w = frame.width * ratio_x
//! piece_w     = src_frame_w / cols
//! src_x(col)  = src_frame_x + col * piece_w
//! ```
//!
//! and the same for y. `off_x` is where the frame's left edge sits inside the
//! rendered image, so every cell covers exactly the source pixels that appear
//! under it in the preview.

use super::{FrameRect, Rect};
use crate::{GridConfig, TransformState};

/// Where the whole source image is drawn, in preview-surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderRect {
    /// Center X
    pub cx: f64,
    /// Center Y
    pub cy: f64,
    /// Drawn width
    pub draw_w: f64,
    /// Drawn height
    pub draw_h: f64,
}

impl RenderRect {
    pub fn left(&self) -> f64 {
        self.cx - self.draw_w / 2.0
    }

    pub fn top(&self) -> f64 {
        self.cy - self.draw_h / 2.0
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.left(), self.top(), self.draw_w, self.draw_h)
    }
}

/// Source-pixel rectangle consumed by one exported cell.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CellRect {
    pub src_x: f64,
    pub src_y: f64,
    pub src_w: f64,
    pub src_h: f64,
}

impl CellRect {
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.src_x, self.src_y, self.src_w, self.src_h)
    }

    /// Pixel size of the exported buffer: the piece size rounded to the
    /// nearest integer. `None` when either side rounds to zero.
    pub fn output_size(&self) -> Option<(u32, u32)> {
        let w = self.src_w.round();
        let h = self.src_h.round();
        if !(w >= 1.0 && h >= 1.0) || w > u32::MAX as f64 || h > u32::MAX as f64 {
            return None;
        }
        Some((w as u32, h as u32))
    }
}

/// Compute where the full source image is drawn for the given transform.
pub fn compute_render_rect(frame: &FrameRect, transform: &TransformState) -> RenderRect {
    let center = frame.center();
    RenderRect {
        cx: center.x + transform.position.x,
        cy: center.y + transform.position.y,
        draw_w: frame.width * transform.effective_scale_x(),
        draw_h: frame.height * transform.effective_scale_y(),
    }
}

/// Compute the source-pixel rectangle of cell `(row, col)`.
///
/// # Arguments
///
/// * `frame` - The grid window last shown to the user
/// * `transform` - Current pan/zoom/stretch
/// * `render` - Render rectangle derived from `frame` and `transform`
/// * `source_size` - Source image `(width, height)` in pixels
/// * `grid` - Row and column counts
/// * `row`, `col` - Zero-indexed cell position
///
/// The caller is responsible for passing a non-degenerate frame and render
/// rectangle; [`GridGeometry`] validates these once for all cells.
pub fn compute_cell_source_rect(
    frame: &FrameRect,
    transform: &TransformState,
    render: &RenderRect,
    source_size: (u32, u32),
    grid: GridConfig,
    row: u32,
    col: u32,
) -> CellRect {
    let (source_w, source_h) = (source_size.0 as f64, source_size.1 as f64);

    // Source pixels per rendered preview pixel
    let ratio_x = source_w / render.draw_w;
    let ratio_y = source_h / render.draw_h;

    // Frame origin relative to the rendered image's top-left
    let off_x = (render.draw_w - frame.width) / 2.0 - transform.position.x;
    let off_y = (render.draw_h - frame.height) / 2.0 - transform.position.y;

    let src_frame_x = off_x * ratio_x;
    let src_frame_y = off_y * ratio_y;
    let src_frame_w = frame.width * ratio_x;
    let src_frame_h = frame.height * ratio_y;

    let piece_w = src_frame_w / grid.cols as f64;
    let piece_h = src_frame_h / grid.rows as f64;

    CellRect {
        src_x: src_frame_x + col as f64 * piece_w,
        src_y: src_frame_y + row as f64 * piece_h,
        src_w: piece_w,
        src_h: piece_h,
    }
}

/// One cell of the grid with its position and source rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub row: u32,
    pub col: u32,
    /// 1-based, row-major index used for file naming
    pub index: u32,
    pub rect: CellRect,
}

/// Validated snapshot of everything the cell mapping depends on.
///
/// Construction fails for degenerate inputs, so every rectangle derived from
/// a `GridGeometry` is finite. It is cheap to build and is rebuilt after each
/// state mutation rather than cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    frame: FrameRect,
    transform: TransformState,
    render: RenderRect,
    source_size: (u32, u32),
    grid: GridConfig,
}

impl GridGeometry {
    pub fn new(
        frame: FrameRect,
        transform: TransformState,
        source_size: (u32, u32),
        grid: GridConfig,
    ) -> Option<Self> {
        if !frame.is_valid() || !transform.is_valid() || !grid.is_valid() {
            return None;
        }
        if source_size.0 == 0 || source_size.1 == 0 {
            return None;
        }

        let render = compute_render_rect(&frame, &transform);
        let drawable = |v: f64| v.is_finite() && v > 0.0;
        if !drawable(render.draw_w)
            || !drawable(render.draw_h)
            || !render.cx.is_finite()
            || !render.cy.is_finite()
        {
            return None;
        }

        Some(Self {
            frame,
            transform,
            render,
            source_size,
            grid,
        })
    }

    pub fn frame(&self) -> &FrameRect {
        &self.frame
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn render_rect(&self) -> &RenderRect {
        &self.render
    }

    pub fn source_size(&self) -> (u32, u32) {
        self.source_size
    }

    pub fn grid(&self) -> GridConfig {
        self.grid
    }

    pub fn cell_count(&self) -> u32 {
        self.grid.cell_count()
    }

    /// The region of the source image under the whole frame.
    pub fn source_frame(&self) -> CellRect {
        let whole = GridConfig::new(1, 1);
        compute_cell_source_rect(
            &self.frame,
            &self.transform,
            &self.render,
            self.source_size,
            whole,
            0,
            0,
        )
    }

    /// Source rectangle of cell `(row, col)`, or `None` outside the grid.
    pub fn cell(&self, row: u32, col: u32) -> Option<CellRect> {
        if row >= self.grid.rows || col >= self.grid.cols {
            return None;
        }
        Some(compute_cell_source_rect(
            &self.frame,
            &self.transform,
            &self.render,
            self.source_size,
            self.grid,
            row,
            col,
        ))
    }

    /// Cell by its 1-based, row-major index.
    pub fn cell_at_index(&self, index: u32) -> Option<GridCell> {
        if index == 0 || index > self.cell_count() {
            return None;
        }
        let zero_based = index - 1;
        let (row, col) = (zero_based / self.grid.cols, zero_based % self.grid.cols);
        self.cell(row, col).map(|rect| GridCell {
            row,
            col,
            index,
            rect,
        })
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        (1..=self.cell_count()).filter_map(move |index| self.cell_at_index(index))
    }

    /// Bounds of cell `(row, col)` in preview-surface pixels.
    pub fn frame_cell_bounds(&self, row: u32, col: u32) -> Option<Rect> {
        if row >= self.grid.rows || col >= self.grid.cols {
            return None;
        }
        let cell_w = self.frame.width / self.grid.cols as f64;
        let cell_h = self.frame.height / self.grid.rows as f64;
        Some(Rect::new(
            self.frame.x + col as f64 * cell_w,
            self.frame.y + row as f64 * cell_h,
            cell_w,
            cell_h,
        ))
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

//! Live preview rendering.
//!
//! The preview is drawn in immediate mode onto a [`PreviewSurface`]:
//!
//! 1. Clear
//! 2. Source image at the render rectangle
//! 3. Dimmed mask over everything outside the frame (even-odd fill)
//! 4. Dashed grid dividers inside the frame
//! 5. Solid border around the frame
//!
//! Two surfaces are provided: [`DisplayList`] records serializable commands
//! for a host canvas to replay, and [`RasterSurface`] rasterizes in software.
//! Redraws are coalesced by [`RedrawScheduler`].

mod display_list;
mod raster;
mod schedule;

pub use display_list::{DisplayList, DrawCommand};
pub use raster::RasterSurface;
pub use schedule::RedrawScheduler;

use crate::decode::SourceImage;
use crate::geometry::{FrameRect, GridGeometry, Rect};
use crate::{GridConfig, Point, TransformState};
use serde::{Deserialize, Serialize};

/// Color with 8-bit channels and a fractional alpha, as in CSS `rgba()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity (0.0 to 1.0)
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// CSS color string for a 2D canvas context.
    pub fn to_css(&self) -> String {
        format!("rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

/// Line style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
    /// Alternating on/off lengths; empty for a solid line
    pub dash: Vec<f64>,
}

impl Stroke {
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dash: Vec::new(),
        }
    }

    pub fn dashed(color: Color, width: f64, on: f64, off: f64) -> Self {
        Self {
            color,
            width,
            dash: vec![on, off],
        }
    }
}

/// Colors and strokes of the preview overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewStyle {
    /// Fill outside the frame
    pub mask: Color,
    /// Cell dividers
    pub grid_line: Stroke,
    /// Frame outline
    pub border: Stroke,
}

const GRID_RED: Color = Color::rgb(0xef, 0x44, 0x44);

impl PreviewStyle {
    pub fn dark() -> Self {
        Self {
            mask: Color::rgba(0, 0, 0, 0.7),
            grid_line: Stroke::dashed(GRID_RED, 1.5, 5.0, 5.0),
            border: Stroke::solid(GRID_RED, 1.5),
        }
    }

    pub fn light() -> Self {
        Self {
            mask: Color::rgba(255, 255, 255, 0.85),
            ..Self::dark()
        }
    }
}

impl Default for PreviewStyle {
    fn default() -> Self {
        Self::dark()
    }
}

/// A 2D target the preview can be drawn on.
pub trait PreviewSurface {
    /// Surface size in preview pixels.
    fn size(&self) -> (f64, f64);

    fn clear(&mut self);

    /// Draw the whole source image scaled into `dest`.
    fn draw_image(&mut self, image: &SourceImage, dest: Rect);

    /// Fill `outer` minus `hole` (even-odd rule).
    fn fill_even_odd(&mut self, outer: Rect, hole: Rect, color: Color);

    fn stroke_line(&mut self, from: Point, to: Point, stroke: &Stroke);

    fn stroke_rect(&mut self, rect: Rect, stroke: &Stroke) {
        let (l, t, r, b) = (rect.x, rect.y, rect.right(), rect.bottom());
        self.stroke_line(Point::new(l, t), Point::new(r, t), stroke);
        self.stroke_line(Point::new(r, t), Point::new(r, b), stroke);
        self.stroke_line(Point::new(r, b), Point::new(l, b), stroke);
        self.stroke_line(Point::new(l, b), Point::new(l, t), stroke);
    }
}

/// Draw one preview frame.
///
/// Never fails: if the inputs do not form a valid geometry (zero-sized
/// frame, non-finite transform) the surface is only cleared. Any image
/// placement, however far off-screen, degrades to clipping.
pub fn render_preview<S: PreviewSurface + ?Sized>(
    surface: &mut S,
    image: &SourceImage,
    frame: &FrameRect,
    transform: &TransformState,
    grid: GridConfig,
    style: &PreviewStyle,
) {
    surface.clear();

    let Some(geometry) = GridGeometry::new(*frame, *transform, image.dimensions(), grid) else {
        log::debug!("Skipping preview draw: degenerate geometry");
        return;
    };

    surface.draw_image(image, geometry.render_rect().to_rect());

    let (width, height) = surface.size();
    let frame_rect = frame.to_rect();
    surface.fill_even_odd(Rect::new(0.0, 0.0, width, height), frame_rect, style.mask);

    let cell_w = frame.width / grid.cols as f64;
    for i in 1..grid.cols {
        let x = frame.x + i as f64 * cell_w;
        surface.stroke_line(
            Point::new(x, frame.y),
            Point::new(x, frame_rect.bottom()),
            &style.grid_line,
        );
    }

    let cell_h = frame.height / grid.rows as f64;
    for i in 1..grid.rows {
        let y = frame.y + i as f64 * cell_h;
        surface.stroke_line(
            Point::new(frame.x, y),
            Point::new(frame_rect.right(), y),
            &style.grid_line,
        );
    }

    surface.stroke_rect(frame_rect, &style.border);
}

//! Software rasterizer for the preview.
//!
//! Pixel centers sit at `(x + 0.5, y + 0.5)`. Every primitive is clipped to
//! the surface before iterating, so off-screen geometry costs nothing and
//! never indexes out of bounds.

use std::collections::HashSet;

use super::{Color, PreviewSurface, Stroke};
use crate::decode::SourceImage;
use crate::geometry::Rect;
use crate::Point;

/// Distance between stroke samples along a line, in pixels.
const SAMPLE_STEP: f64 = 0.5;

/// RGBA8 canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    /// RGBA, row-major, 4 bytes per pixel
    pixels: Vec<u8>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = self.index(x, y);
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Integer pixel span `[start, end)` whose centers may fall in `[lo, hi)`,
    /// clipped to `[0, limit)`.
    fn span(lo: f64, hi: f64, limit: u32) -> (u32, u32) {
        let start = (lo - 0.5).ceil().clamp(0.0, limit as f64) as u32;
        let end = (hi - 0.5).ceil().clamp(0.0, limit as f64) as u32;
        (start, end.max(start))
    }

    /// Source-over blend of a straight-alpha color onto pixel `(x, y)`.
    fn blend(&mut self, x: u32, y: u32, rgb: [u8; 3], alpha: f32) {
        let sa = alpha.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let idx = self.index(x, y);
        let dst = &mut self.pixels[idx..idx + 4];
        let da = dst[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            dst.copy_from_slice(&[0, 0, 0, 0]);
            return;
        }
        for c in 0..3 {
            let value = (rgb[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
            dst[c] = value.round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = (out_a * 255.0).round() as u8;
    }

    fn paint(&mut self, x: u32, y: u32, color: Color) {
        self.blend(x, y, [color.r, color.g, color.b], color.a);
    }
}

impl PreviewSurface for RasterSurface {
    fn size(&self) -> (f64, f64) {
        (self.width as f64, self.height as f64)
    }

    fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Nearest-neighbour blit; the preview favours speed over filtering.
    fn draw_image(&mut self, image: &SourceImage, dest: Rect) {
        if image.is_empty() || !dest.is_finite() || dest.width <= 0.0 || dest.height <= 0.0 {
            return;
        }

        let (x0, x1) = Self::span(dest.x, dest.right(), self.width);
        let (y0, y1) = Self::span(dest.y, dest.bottom(), self.height);
        let sx_scale = image.width as f64 / dest.width;
        let sy_scale = image.height as f64 / dest.height;

        for y in y0..y1 {
            let v = ((y as f64 + 0.5 - dest.y) * sy_scale).floor();
            if v < 0.0 || v >= image.height as f64 {
                continue;
            }
            for x in x0..x1 {
                let u = ((x as f64 + 0.5 - dest.x) * sx_scale).floor();
                if u < 0.0 || u >= image.width as f64 {
                    continue;
                }
                let [r, g, b, a] = image.pixel(u as u32, v as u32);
                self.blend(x, y, [r, g, b], a as f32 / 255.0);
            }
        }
    }

    fn fill_even_odd(&mut self, outer: Rect, hole: Rect, color: Color) {
        if !outer.is_finite() {
            return;
        }
        let (x0, x1) = Self::span(outer.x, outer.right(), self.width);
        let (y0, y1) = Self::span(outer.y, outer.bottom(), self.height);

        for y in y0..y1 {
            let cy = y as f64 + 0.5;
            for x in x0..x1 {
                let cx = x as f64 + 0.5;
                // Inside both rectangles: crossed twice, not filled
                if !hole.contains(cx, cy) {
                    self.paint(x, y, color);
                }
            }
        }
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        if !from.is_finite() || !to.is_finite() || stroke.width.is_nan() || stroke.width <= 0.0 {
            return;
        }
        let half = stroke.width / 2.0;
        let Some((t0, t1)) = clip_segment(
            from,
            to,
            Rect::new(
                -half,
                -half,
                self.width as f64 + stroke.width,
                self.height as f64 + stroke.width,
            ),
        ) else {
            return;
        };

        let delta = to - from;
        let length = delta.x.hypot(delta.y);
        let pattern: f64 = stroke.dash.iter().sum();
        let dashed = stroke.dash.len() >= 2 && pattern > 0.0;

        // Collect coverage first so overlapping samples blend once
        let mut covered = HashSet::new();
        let start = t0 * length;
        let steps = ((t1 - t0) * length / SAMPLE_STEP).floor() as usize;
        for i in 0..=steps {
            let d = start + i as f64 * SAMPLE_STEP;
            if dashed && (d % pattern) >= stroke.dash[0] {
                continue;
            }
            let t = if length > 0.0 { d / length } else { 0.0 };
            let p = Point::new(from.x + delta.x * t, from.y + delta.y * t);
            let (x0, x1) = Self::span(p.x - half, p.x + half, self.width);
            let (y0, y1) = Self::span(p.y - half, p.y + half, self.height);
            for y in y0..y1 {
                for x in x0..x1 {
                    covered.insert((x, y));
                }
            }
        }

        for (x, y) in covered {
            self.paint(x, y, stroke.color);
        }
    }
}

/// Liang-Barsky clip of the segment `from -> to` against `bounds`.
///
/// Returns the parameter range `[t0, t1]` of the visible part.
fn clip_segment(from: Point, to: Point, bounds: Rect) -> Option<(f64, f64)> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    let checks = [
        (-dx, from.x - bounds.x),
        (dx, bounds.right() - from.x),
        (-dy, from.y - bounds.y),
        (dy, bounds.bottom() - from.y),
    ];

    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((t0, t1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::compute_frame_rect;
    use crate::render::{render_preview, PreviewStyle};
    use crate::{GridConfig, TransformState};

    fn solid_image(width: u32, height: u32, rgba: [u8; 4]) -> SourceImage {
        SourceImage::new(width, height, rgba.repeat((width * height) as usize))
    }

    #[test]
    fn test_draw_image_scales_nearest() {
        let mut pixels = Vec::new();
        pixels.extend_from_slice(&[255, 0, 0, 255]); // left red
        pixels.extend_from_slice(&[0, 0, 255, 255]); // right blue
        let img = SourceImage::new(2, 1, pixels);

        let mut surface = RasterSurface::new(4, 2);
        surface.draw_image(&img, Rect::new(0.0, 0.0, 4.0, 2.0));

        assert_eq!(surface.pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(surface.pixel(1, 1), [255, 0, 0, 255]);
        assert_eq!(surface.pixel(2, 0), [0, 0, 255, 255]);
        assert_eq!(surface.pixel(3, 1), [0, 0, 255, 255]);
    }

    #[test]
    fn test_draw_image_clipped_offscreen() {
        let img = solid_image(10, 10, [9, 9, 9, 255]);
        let mut surface = RasterSurface::new(8, 8);

        surface.draw_image(&img, Rect::new(-1.0e9, -1.0e9, 20.0, 20.0));
        surface.draw_image(&img, Rect::new(6.0, 6.0, 1.0e7, 1.0e7));

        assert_eq!(surface.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(surface.pixel(7, 7), [9, 9, 9, 255]);
    }

    #[test]
    fn test_fill_even_odd_leaves_hole() {
        let mut surface = RasterSurface::new(10, 10);
        surface.fill_even_odd(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(2.0, 2.0, 6.0, 6.0),
            Color::rgb(10, 20, 30),
        );

        assert_eq!(surface.pixel(0, 0), [10, 20, 30, 255]);
        assert_eq!(surface.pixel(9, 5), [10, 20, 30, 255]);
        assert_eq!(surface.pixel(2, 2), [0, 0, 0, 0]);
        assert_eq!(surface.pixel(7, 7), [0, 0, 0, 0]);
        assert_eq!(surface.pixel(8, 8), [10, 20, 30, 255]);
    }

    #[test]
    fn test_translucent_mask_dims_image() {
        let img = solid_image(4, 4, [200, 200, 200, 255]);
        let mut surface = RasterSurface::new(4, 4);
        surface.draw_image(&img, Rect::new(0.0, 0.0, 4.0, 4.0));
        surface.fill_even_odd(
            Rect::new(0.0, 0.0, 4.0, 4.0),
            Rect::new(0.0, 0.0, 0.0, 0.0),
            Color::rgba(0, 0, 0, 0.5),
        );

        assert_eq!(surface.pixel(1, 1), [100, 100, 100, 255]);
    }

    #[test]
    fn test_solid_vertical_line() {
        let mut surface = RasterSurface::new(10, 10);
        let stroke = Stroke::solid(Color::rgb(255, 0, 0), 1.0);
        surface.stroke_line(Point::new(4.5, 0.0), Point::new(4.5, 10.0), &stroke);

        for y in 0..10 {
            assert_eq!(surface.pixel(4, y), [255, 0, 0, 255], "row {}", y);
            assert_eq!(surface.pixel(3, y)[3], 0);
            assert_eq!(surface.pixel(5, y)[3], 0);
        }
    }

    #[test]
    fn test_dashed_line_has_gaps() {
        let mut surface = RasterSurface::new(40, 3);
        let stroke = Stroke::dashed(Color::rgb(0, 255, 0), 1.0, 5.0, 5.0);
        surface.stroke_line(Point::new(0.0, 1.5), Point::new(40.0, 1.5), &stroke);

        assert_eq!(surface.pixel(1, 1)[3], 255);
        assert_eq!(surface.pixel(7, 1)[3], 0);
        assert_eq!(surface.pixel(11, 1)[3], 255);
    }

    #[test]
    fn test_line_far_outside_is_ignored() {
        let mut surface = RasterSurface::new(5, 5);
        let stroke = Stroke::solid(Color::rgb(1, 2, 3), 1.5);
        surface.stroke_line(Point::new(-1.0e12, 100.0), Point::new(1.0e12, 100.0), &stroke);
        assert!(surface.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_clip_segment() {
        let bounds = Rect::new(0.0, 0.0, 10.0, 10.0);
        let (t0, t1) = clip_segment(Point::new(-10.0, 5.0), Point::new(20.0, 5.0), bounds).unwrap();
        assert!((t0 - 1.0 / 3.0).abs() < 1e-12);
        assert!((t1 - 2.0 / 3.0).abs() < 1e-12);
        assert!(clip_segment(Point::new(-5.0, -5.0), Point::new(-1.0, -1.0), bounds).is_none());
    }

    #[test]
    fn test_full_preview_frame() {
        let img = solid_image(100, 100, [255, 255, 255, 255]);
        let frame = compute_frame_rect(200.0, 200.0, 100, 100).unwrap();
        let mut surface = RasterSurface::new(200, 200);

        render_preview(
            &mut surface,
            &img,
            &frame,
            &TransformState::default(),
            GridConfig::new(2, 2),
            &PreviewStyle::dark(),
        );

        // Inside a cell: untouched image
        assert_eq!(surface.pixel(50, 50), [255, 255, 255, 255]);
        // Outside the frame: transparent background under the mask
        let masked = surface.pixel(1, 1);
        assert_eq!(&masked[0..3], &[0, 0, 0]);
        assert!((178..=179).contains(&masked[3]));
        // Frame border at the top-left corner is red
        let border = surface.pixel(5, 5);
        assert_eq!(&border[0..3], &[0xef, 0x44, 0x44]);
    }

    #[test]
    fn test_extreme_transform_does_not_panic() {
        let img = solid_image(50, 30, [1, 2, 3, 255]);
        let frame = compute_frame_rect(120.0, 80.0, 50, 30).unwrap();
        let mut surface = RasterSurface::new(120, 80);

        for (scale, offset) in [(0.1, 1.0e9), (5.0, -1.0e9), (5.0, 0.0), (0.1, 0.0)] {
            let transform = TransformState {
                scale_global: scale,
                scale_x: 2.0,
                scale_y: 0.5,
                position: Point::new(offset, -offset),
            };
            render_preview(
                &mut surface,
                &img,
                &frame,
                &transform,
                GridConfig::new(10, 10),
                &PreviewStyle::light(),
            );
        }
    }
}

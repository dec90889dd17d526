//! Cell rasterization at full source resolution.

use crate::decode::SourceImage;
use crate::geometry::CellRect;

/// Largest exported cell area in pixels, the per-canvas area limit browsers
/// enforce.
pub const MAX_CELL_PIXELS: u64 = 16_384 * 16_384;

/// Longest exported cell side in pixels.
pub const MAX_CELL_SIDE: u32 = 32_767;

/// Byte length of a `width x height` RGBA cell buffer.
///
/// `None` when the cell exceeds [`MAX_CELL_SIDE`] or [`MAX_CELL_PIXELS`], or
/// the length does not fit in `usize`.
pub fn cell_buffer_len(width: u32, height: u32) -> Option<usize> {
    if width > MAX_CELL_SIDE || height > MAX_CELL_SIDE {
        return None;
    }
    let pixels = (width as u64).checked_mul(height as u64)?;
    if pixels > MAX_CELL_PIXELS {
        return None;
    }
    usize::try_from(pixels.checked_mul(4)?).ok()
}

/// Resample the source rectangle `rect` into a `width x height` RGBA buffer.
///
/// Output pixel centers map linearly onto `rect`. Centers that land outside
/// the source image produce transparent pixels; inside, the four nearest
/// source pixels are blended bilinearly in premultiplied alpha, with taps
/// clamped to the image edge. A rectangle that matches the output size on
/// whole pixels copies the source exactly.
///
/// Returns `None` without allocating when the cell is over the size limits
/// (see [`cell_buffer_len`]).
pub fn rasterize_cell(
    image: &SourceImage,
    rect: &CellRect,
    width: u32,
    height: u32,
) -> Option<Vec<u8>> {
    let mut out = vec![0u8; cell_buffer_len(width, height)?];
    if image.is_empty() || width == 0 || height == 0 {
        return Some(out);
    }

    let step_x = rect.src_w / width as f64;
    let step_y = rect.src_h / height as f64;
    let (img_w, img_h) = (image.width as f64, image.height as f64);

    for oy in 0..height {
        let v = rect.src_y + (oy as f64 + 0.5) * step_y;
        if !(v >= 0.0 && v < img_h) {
            continue;
        }
        let row = oy as usize * width as usize * 4;
        for ox in 0..width {
            let u = rect.src_x + (ox as f64 + 0.5) * step_x;
            if !(u >= 0.0 && u < img_w) {
                continue;
            }
            let idx = row + ox as usize * 4;
            out[idx..idx + 4].copy_from_slice(&sample_bilinear(image, u - 0.5, v - 0.5));
        }
    }

    Some(out)
}

/// Bilinear sample at continuous pixel coordinates (pixel centers on
/// integers), edge-clamped.
fn sample_bilinear(image: &SourceImage, x: f64, y: f64) -> [u8; 4] {
    let max_x = image.width - 1;
    let max_y = image.height - 1;

    let x = x.clamp(0.0, max_x as f64);
    let y = y.clamp(0.0, max_y as f64);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(max_x);
    let y1 = (y0 + 1).min(max_y);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let taps = [
        (premultiplied(image.pixel(x0, y0)), (1.0 - fx) * (1.0 - fy)),
        (premultiplied(image.pixel(x1, y0)), fx * (1.0 - fy)),
        (premultiplied(image.pixel(x0, y1)), (1.0 - fx) * fy),
        (premultiplied(image.pixel(x1, y1)), fx * fy),
    ];

    let mut acc = [0.0f64; 4];
    for (p, w) in taps {
        for i in 0..4 {
            acc[i] += p[i] * w;
        }
    }

    let alpha = acc[3];
    if alpha <= 0.0 {
        return [0, 0, 0, 0];
    }

    let mut result = [0u8; 4];
    for i in 0..3 {
        result[i] = (acc[i] / alpha * 255.0).clamp(0.0, 255.0).round() as u8;
    }
    result[3] = alpha.clamp(0.0, 255.0).round() as u8;
    result
}

/// Color channels scaled to `[0, alpha]`, alpha kept in `[0, 255]`.
#[inline]
fn premultiplied(p: [u8; 4]) -> [f64; 4] {
    let a = p[3] as f64;
    let f = a / 255.0;
    [p[0] as f64 * f, p[1] as f64 * f, p[2] as f64 * f, a]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> SourceImage {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x * 10) as u8, (y * 10) as u8, 7, 255]);
            }
        }
        SourceImage::new(width, height, pixels)
    }

    fn rect(x: f64, y: f64, w: f64, h: f64) -> CellRect {
        CellRect {
            src_x: x,
            src_y: y,
            src_w: w,
            src_h: h,
        }
    }

    #[test]
    fn test_cell_buffer_len_limits() {
        assert_eq!(cell_buffer_len(4, 3), Some(48));
        assert_eq!(cell_buffer_len(0, 3), Some(0));
        assert_eq!(cell_buffer_len(16_384, 16_384), Some(16_384 * 16_384 * 4));
        // Side limit
        assert_eq!(cell_buffer_len(40_320, 30_240), None);
        assert_eq!(cell_buffer_len(32_768, 1), None);
        // Area limit with both sides in range
        assert_eq!(cell_buffer_len(30_000, 22_500), None);
        assert_eq!(cell_buffer_len(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn test_oversized_cell_is_refused() {
        let img = gradient(4, 4);
        assert!(rasterize_cell(&img, &rect(0.0, 0.0, 4.0, 4.0), 40_320, 30_240).is_none());
    }

    #[test]
    fn test_identity_copies_exactly() {
        let img = gradient(6, 4);
        let out = rasterize_cell(&img, &rect(0.0, 0.0, 6.0, 4.0), 6, 4).unwrap();
        assert_eq!(out, img.pixels);
    }

    #[test]
    fn test_sub_rect_copies_exactly() {
        let img = gradient(6, 4);
        let out = rasterize_cell(&img, &rect(2.0, 1.0, 3.0, 2.0), 3, 2).unwrap();
        assert_eq!(&out[0..4], &img.pixel(2, 1));
        assert_eq!(&out[20..24], &img.pixel(4, 2));
    }

    #[test]
    fn test_out_of_bounds_is_transparent() {
        let img = gradient(4, 4);
        // Left half of the rect lies left of the image
        let out = rasterize_cell(&img, &rect(-4.0, 0.0, 8.0, 4.0), 8, 4).unwrap();
        for y in 0..4usize {
            for x in 0..4usize {
                let idx = (y * 8 + x) * 4;
                assert_eq!(&out[idx..idx + 4], &[0, 0, 0, 0], "({}, {})", x, y);
            }
            let idx = (y * 8 + 4) * 4;
            assert_eq!(out[idx + 3], 255);
        }
    }

    #[test]
    fn test_fully_outside_is_transparent() {
        let img = gradient(4, 4);
        let out = rasterize_cell(&img, &rect(100.0, 100.0, 4.0, 4.0), 4, 4).unwrap();
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_upscale_interpolates() {
        let pixels = vec![0, 0, 0, 255, 200, 200, 200, 255];
        let img = SourceImage::new(2, 1, pixels);
        let out = rasterize_cell(&img, &rect(0.0, 0.0, 2.0, 1.0), 4, 1).unwrap();
        // Output centers at 0.25, 0.75, 1.25, 1.75 -> sample x -0.25, 0.25, 0.75, 1.25
        assert_eq!(out[0], 0);
        assert_eq!(out[4], 50);
        assert_eq!(out[8], 150);
        assert_eq!(out[12], 200);
    }

    #[test]
    fn test_transparent_neighbour_does_not_darken() {
        // Opaque white next to fully transparent black
        let pixels = vec![255, 255, 255, 255, 0, 0, 0, 0];
        let img = SourceImage::new(2, 1, pixels);
        let out = rasterize_cell(&img, &rect(0.5, 0.0, 1.0, 1.0), 1, 1).unwrap();
        // Halfway: color stays white, alpha halves
        assert_eq!(&out[0..3], &[255, 255, 255]);
        assert!((127..=128).contains(&out[3]));
    }
}

//! Frame (grid window) fitting.
//!
//! The frame is letterboxed to the image, not the other way round, so the
//! whole image fits the frame without distortion at the default transform.

use super::Rect;
use crate::Point;

/// Fraction of the container the frame occupies along its limiting axis.
pub const DEFAULT_FRAME_FILL: f64 = 0.95;

/// The fixed on-screen rectangle that represents the exportable area.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FrameRect {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Finite origin, finite and strictly positive size.
    pub fn is_valid(&self) -> bool {
        self.to_rect().is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Fit the frame into the container at the default 95% fill.
///
/// Returns `None` while either the container or the image has no usable
/// size (not laid out yet, image not decoded yet), so callers never see a
/// NaN or infinite frame.
///
/// # Example
///
/// ```ignore
/// // 1200x900 image in an 800x600 container: same aspect, height-limited
/// let frame = compute_frame_rect(800.0, 600.0, 1200, 900).unwrap();
/// assert_eq!(frame.height, 570.0);
/// ```
pub fn compute_frame_rect(
    container_w: f64,
    container_h: f64,
    image_w: u32,
    image_h: u32,
) -> Option<FrameRect> {
    compute_frame_rect_with_fill(container_w, container_h, image_w, image_h, DEFAULT_FRAME_FILL)
}

/// Fit the frame into the container using a custom fill ratio.
pub fn compute_frame_rect_with_fill(
    container_w: f64,
    container_h: f64,
    image_w: u32,
    image_h: u32,
    fill: f64,
) -> Option<FrameRect> {
    let usable = |v: f64| v.is_finite() && v > 0.0;
    if !usable(container_w) || !usable(container_h) || !usable(fill) {
        return None;
    }
    if image_w == 0 || image_h == 0 {
        return None;
    }

    let img_aspect = image_w as f64 / image_h as f64;
    let container_aspect = container_w / container_h;

    let (w, h) = if img_aspect > container_aspect {
        // Width-limited
        let w = container_w * fill;
        (w, w / img_aspect)
    } else {
        // Height-limited
        let h = container_h * fill;
        (h * img_aspect, h)
    };

    Some(FrameRect {
        x: (container_w - w) / 2.0,
        y: (container_h - h) / 2.0,
        width: w,
        height: h,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: The frame keeps the image aspect ratio.
        #[test]
        fn prop_frame_matches_image_aspect(
            container_w in 10.0f64..4000.0,
            container_h in 10.0f64..4000.0,
            image_w in 1u32..=8000,
            image_h in 1u32..=8000,
        ) {
            let frame = compute_frame_rect(container_w, container_h, image_w, image_h).unwrap();
            let expected = image_w as f64 / image_h as f64;
            prop_assert!(
                (frame.aspect_ratio() - expected).abs() <= expected * 1e-9,
                "aspect {} vs {}", frame.aspect_ratio(), expected
            );
        }

        /// Property: The frame fits inside the container.
        #[test]
        fn prop_frame_inside_container(
            container_w in 10.0f64..4000.0,
            container_h in 10.0f64..4000.0,
            image_w in 1u32..=8000,
            image_h in 1u32..=8000,
        ) {
            let frame = compute_frame_rect(container_w, container_h, image_w, image_h).unwrap();
            prop_assert!(frame.is_valid());
            prop_assert!(frame.x >= 0.0 && frame.y >= 0.0);
            prop_assert!(frame.width <= container_w * DEFAULT_FRAME_FILL * (1.0 + 1e-12));
            prop_assert!(frame.height <= container_h * DEFAULT_FRAME_FILL * (1.0 + 1e-12));
        }
    }
}

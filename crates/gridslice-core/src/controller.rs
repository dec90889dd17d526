//! Interactive transform and grid state.
//!
//! The controller owns the pan/zoom/stretch values and the grid size, and
//! applies every input under the clamping rules of [`EditorConfig`]. It never
//! draws; each mutator returns `true` when state actually changed so the
//! caller can schedule a redraw.

use crate::config::EditorConfig;
use crate::{GridConfig, Point, TransformState};

/// Which scale a slider step applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ScaleAxis {
    Global,
    X,
    Y,
}

/// Owner of the interactive editing state.
#[derive(Debug, Clone)]
pub struct TransformController {
    config: EditorConfig,
    transform: TransformState,
    grid: GridConfig,
    /// Pointer position minus pan offset at drag start, while dragging
    drag_anchor: Option<Point>,
}

impl Default for TransformController {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl TransformController {
    pub fn new(config: EditorConfig) -> Self {
        let grid = GridConfig::default();
        let grid = GridConfig::new(
            grid.rows.clamp(1, config.max_rows.max(1)),
            grid.cols.clamp(1, config.max_cols.max(1)),
        );
        Self {
            config,
            transform: TransformState::default(),
            grid,
            drag_anchor: None,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn grid(&self) -> GridConfig {
        self.grid
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    // ------------------------------------------------------------------
    // Pan
    // ------------------------------------------------------------------

    /// Begin a drag at `pointer`.
    pub fn pointer_down(&mut self, pointer: Point) {
        if !pointer.is_finite() {
            return;
        }
        self.drag_anchor = Some(pointer - self.transform.position);
    }

    /// Follow the pointer while a drag is active. Panning is unclamped.
    pub fn pointer_move(&mut self, pointer: Point) -> bool {
        let Some(anchor) = self.drag_anchor else {
            return false;
        };
        if !pointer.is_finite() {
            return false;
        }
        let position = pointer - anchor;
        if position == self.transform.position {
            return false;
        }
        self.transform.position = position;
        true
    }

    /// End the drag. The image stays where it was dropped.
    pub fn pointer_up(&mut self) {
        self.drag_anchor = None;
    }

    /// The pointer left the preview; treated like a release.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    /// Move the image by a relative offset.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
        let delta = Point::new(dx, dy);
        if !delta.is_finite() || (dx == 0.0 && dy == 0.0) {
            return false;
        }
        self.transform.position = self.transform.position + delta;
        true
    }

    // ------------------------------------------------------------------
    // Scale
    // ------------------------------------------------------------------

    /// Zoom from a wheel event. Scrolling down (`delta_y > 0`) zooms out.
    pub fn wheel(&mut self, delta_y: f64) -> bool {
        self.nudge_scale(-delta_y * self.config.wheel_sensitivity)
    }

    /// Add `delta` to the global scale, clamped.
    pub fn nudge_scale(&mut self, delta: f64) -> bool {
        if !delta.is_finite() {
            return false;
        }
        self.set_scale_global(self.transform.scale_global + delta)
    }

    pub fn set_scale_global(&mut self, value: f64) -> bool {
        let range = self.config.global_scale;
        Self::assign_scale(&mut self.transform.scale_global, value, |v| range.clamp(v))
    }

    pub fn set_scale_x(&mut self, value: f64) -> bool {
        let range = self.config.axis_scale;
        Self::assign_scale(&mut self.transform.scale_x, value, |v| range.clamp(v))
    }

    pub fn set_scale_y(&mut self, value: f64) -> bool {
        let range = self.config.axis_scale;
        Self::assign_scale(&mut self.transform.scale_y, value, |v| range.clamp(v))
    }

    pub fn set_scale(&mut self, axis: ScaleAxis, value: f64) -> bool {
        match axis {
            ScaleAxis::Global => self.set_scale_global(value),
            ScaleAxis::X => self.set_scale_x(value),
            ScaleAxis::Y => self.set_scale_y(value),
        }
    }

    pub fn scale(&self, axis: ScaleAxis) -> f64 {
        match axis {
            ScaleAxis::Global => self.transform.scale_global,
            ScaleAxis::X => self.transform.scale_x,
            ScaleAxis::Y => self.transform.scale_y,
        }
    }

    /// One click of a slider's +/- button: move by `slider_step` in the
    /// sign of `direction`, snapped to two decimals.
    pub fn step_scale(&mut self, axis: ScaleAxis, direction: i32) -> bool {
        if direction == 0 {
            return false;
        }
        let step = self.config.slider_step * direction.signum() as f64;
        let next = ((self.scale(axis) + step) * 100.0).round() / 100.0;
        self.set_scale(axis, next)
    }

    fn assign_scale(slot: &mut f64, value: f64, clamp: impl Fn(f64) -> f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        let clamped = clamp(value);
        if clamped == *slot {
            return false;
        }
        *slot = clamped;
        true
    }

    /// Return to the frame-fitted default view. Grid size is kept.
    pub fn reset(&mut self) -> bool {
        if self.transform.is_identity() {
            return false;
        }
        self.transform = TransformState::default();
        true
    }

    // ------------------------------------------------------------------
    // Grid steppers
    // ------------------------------------------------------------------

    pub fn set_rows(&mut self, rows: u32) -> bool {
        let rows = rows.clamp(1, self.config.max_rows.max(1));
        if rows == self.grid.rows {
            return false;
        }
        self.grid.rows = rows;
        true
    }

    pub fn set_cols(&mut self, cols: u32) -> bool {
        let cols = cols.clamp(1, self.config.max_cols.max(1));
        if cols == self.grid.cols {
            return false;
        }
        self.grid.cols = cols;
        true
    }

    pub fn increment_rows(&mut self) -> bool {
        self.set_rows(self.grid.rows.saturating_add(1))
    }

    pub fn decrement_rows(&mut self) -> bool {
        self.set_rows(self.grid.rows.saturating_sub(1))
    }

    pub fn increment_cols(&mut self) -> bool {
        self.set_cols(self.grid.cols.saturating_add(1))
    }

    pub fn decrement_cols(&mut self) -> bool {
        self.set_cols(self.grid.cols.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_moves_by_pointer_delta() {
        let mut ctl = TransformController::default();
        ctl.pointer_down(Point::new(100.0, 100.0));
        assert!(ctl.is_dragging());
        assert!(ctl.pointer_move(Point::new(130.0, 90.0)));
        assert_eq!(ctl.transform().position, Point::new(30.0, -10.0));

        ctl.pointer_up();
        assert!(!ctl.is_dragging());

        // Second drag continues from the dropped position
        ctl.pointer_down(Point::new(0.0, 0.0));
        ctl.pointer_move(Point::new(5.0, 5.0));
        assert_eq!(ctl.transform().position, Point::new(35.0, -5.0));
    }

    #[test]
    fn test_move_without_drag_is_ignored() {
        let mut ctl = TransformController::default();
        assert!(!ctl.pointer_move(Point::new(50.0, 50.0)));
        assert_eq!(ctl.transform().position, Point::default());
    }

    #[test]
    fn test_pointer_leave_ends_drag() {
        let mut ctl = TransformController::default();
        ctl.pointer_down(Point::new(1.0, 1.0));
        ctl.pointer_leave();
        assert!(!ctl.pointer_move(Point::new(9.0, 9.0)));
    }

    #[test]
    fn test_pan_is_unclamped() {
        let mut ctl = TransformController::default();
        assert!(ctl.pan_by(1.0e6, -1.0e6));
        assert_eq!(ctl.transform().position, Point::new(1.0e6, -1.0e6));
    }

    #[test]
    fn test_wheel_zoom_direction_and_clamp() {
        let mut ctl = TransformController::default();
        // Scroll up zooms in
        assert!(ctl.wheel(-100.0));
        assert!((ctl.transform().scale_global - 1.1).abs() < 1e-12);

        // Huge scroll down clamps at min
        ctl.wheel(1.0e9);
        assert_eq!(ctl.transform().scale_global, 0.1);
        assert!(!ctl.wheel(100.0));

        // Huge scroll up clamps at max
        ctl.wheel(-1.0e9);
        assert_eq!(ctl.transform().scale_global, 5.0);
    }

    #[test]
    fn test_axis_scale_clamps() {
        let mut ctl = TransformController::default();
        ctl.set_scale_x(10.0);
        ctl.set_scale_y(0.0);
        assert_eq!(ctl.transform().scale_x, 2.0);
        assert_eq!(ctl.transform().scale_y, 0.5);
    }

    #[test]
    fn test_non_finite_scale_ignored() {
        let mut ctl = TransformController::default();
        assert!(!ctl.set_scale_global(f64::NAN));
        assert!(!ctl.nudge_scale(f64::INFINITY));
        assert_eq!(ctl.transform().scale_global, 1.0);
    }

    #[test]
    fn test_step_scale_snaps_to_hundredths() {
        let mut ctl = TransformController::default();
        for _ in 0..3 {
            ctl.step_scale(ScaleAxis::X, 1);
        }
        assert_eq!(ctl.transform().scale_x, 1.03);

        ctl.step_scale(ScaleAxis::Global, -1);
        assert_eq!(ctl.transform().scale_global, 0.99);

        ctl.set_scale_y(0.5);
        assert!(!ctl.step_scale(ScaleAxis::Y, -1));
    }

    #[test]
    fn test_reset() {
        let mut ctl = TransformController::default();
        ctl.set_scale_global(2.5);
        ctl.set_scale_y(1.5);
        ctl.pan_by(12.0, 7.0);
        ctl.set_rows(5);

        assert!(ctl.reset());
        assert!(ctl.transform().is_identity());
        assert_eq!(ctl.grid().rows, 5);
        assert!(!ctl.reset());
    }

    #[test]
    fn test_steppers_clamp() {
        let mut ctl = TransformController::default();
        ctl.set_rows(1);
        assert!(!ctl.decrement_rows());
        assert_eq!(ctl.grid().rows, 1);

        ctl.set_cols(10);
        assert!(!ctl.increment_cols());
        assert_eq!(ctl.grid().cols, 10);

        ctl.set_rows(4);
        assert!(ctl.set_rows(0));
        assert_eq!(ctl.grid().rows, 1);
        ctl.set_cols(99);
        assert_eq!(ctl.grid().cols, 10);
    }

    #[test]
    fn test_grid_change_keeps_transform() {
        let mut ctl = TransformController::default();
        ctl.set_scale_global(1.7);
        ctl.pan_by(3.0, 4.0);
        let before = *ctl.transform();

        ctl.increment_rows();
        ctl.decrement_cols();
        assert_eq!(*ctl.transform(), before);
    }

    #[test]
    fn test_custom_limits() {
        let mut config = EditorConfig::default();
        config.global_scale = crate::ScaleRange::new(0.5, 3.0);
        config.max_rows = 4;
        let mut ctl = TransformController::new(config);

        ctl.set_scale_global(10.0);
        assert_eq!(ctl.transform().scale_global, 3.0);
        ctl.set_rows(8);
        assert_eq!(ctl.grid().rows, 4);
    }

    #[test]
    fn test_inverted_limits_do_not_panic() {
        let mut config = EditorConfig::default();
        config.global_scale = crate::ScaleRange::new(5.0, 0.1);
        config.axis_scale = crate::ScaleRange::new(f64::NAN, 2.0);
        let mut ctl = TransformController::new(config);

        ctl.wheel(-100.0);
        assert!(ctl.transform().scale_global.is_finite());
        ctl.set_scale_x(3.0);
        assert_eq!(ctl.transform().scale_x, 2.0);
        ctl.step_scale(ScaleAxis::Y, -1);
        assert!(ctl.transform().scale_y.is_finite());
    }
}

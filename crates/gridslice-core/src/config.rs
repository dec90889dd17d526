//! Editor configuration.
//!
//! All bounds the interactive controls enforce live here so the preview and
//! the export path clamp identically. The host may pass a partial object;
//! missing fields fall back to the defaults below.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A host-supplied configuration that the editor cannot run with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid {field} range [{min}, {max}]: bounds must be finite with 0 < min <= max")]
    ScaleRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("Invalid grid limit {rows} x {cols}: need at least 1 x 1 and a cell count within u32")]
    GridLimit { rows: u32, cols: u32 },

    #[error("Invalid {field}: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Inclusive range a scale value is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
}

impl ScaleRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into the range.
    ///
    /// Never panics. On an invalid range `max` wins, and a NaN bound is
    /// ignored.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Finite, positive and ordered.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min > 0.0 && self.min <= self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Runtime configuration for an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Bounds for the overall zoom
    pub global_scale: ScaleRange,
    /// Bounds for the independent X/Y stretch
    pub axis_scale: ScaleRange,
    /// Upper bound of the row stepper
    pub max_rows: u32,
    /// Upper bound of the column stepper
    pub max_cols: u32,
    /// Fraction of the container the frame may occupy
    pub frame_fill: f64,
    /// Zoom change per wheel `deltaY` unit (scrolling down zooms out)
    pub wheel_sensitivity: f64,
    /// Increment of the scale +/- buttons
    pub slider_step: f64,
    /// Quality for lossy export formats (1-100)
    pub export_quality: u8,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            global_scale: ScaleRange::new(0.1, 5.0),
            axis_scale: ScaleRange::new(0.5, 2.0),
            max_rows: 10,
            max_cols: 10,
            frame_fill: 0.95,
            wheel_sensitivity: 0.001,
            slider_step: 0.01,
            export_quality: 95,
        }
    }
}

impl EditorConfig {
    /// Check a host-supplied configuration before a session uses it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            ("global_scale", self.global_scale),
            ("axis_scale", self.axis_scale),
        ];
        for (field, range) in ranges {
            if !range.is_valid() {
                return Err(ConfigError::ScaleRange {
                    field,
                    min: range.min,
                    max: range.max,
                });
            }
        }

        let grid_ok = self.max_rows >= 1
            && self.max_cols >= 1
            && self.max_rows.checked_mul(self.max_cols).is_some();
        if !grid_ok {
            return Err(ConfigError::GridLimit {
                rows: self.max_rows,
                cols: self.max_cols,
            });
        }

        let checks = [
            ("frame_fill", self.frame_fill, self.frame_fill > 0.0 && self.frame_fill <= 1.0),
            (
                "wheel_sensitivity",
                self.wheel_sensitivity,
                self.wheel_sensitivity.is_finite() && self.wheel_sensitivity >= 0.0,
            ),
            (
                "slider_step",
                self.slider_step,
                self.slider_step.is_finite() && self.slider_step > 0.0,
            ),
            (
                "export_quality",
                self.export_quality as f64,
                (1..=100).contains(&self.export_quality),
            ),
        ];
        match checks.into_iter().find(|(_, _, ok)| !ok) {
            Some((field, value, _)) => Err(ConfigError::OutOfRange { field, value }),
            None => Ok(()),
        }
    }
}

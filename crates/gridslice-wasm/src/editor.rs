//! Grid editor WASM bindings.
//!
//! `JsGridEditor` wraps one [`EditorSession`]. The host forwards pointer,
//! wheel and control events to it and, from `requestAnimationFrame`, asks
//! for either a display list (`render_commands`) or a finished RGBA buffer
//! (`render_pixels`).
//!
//! # Example
//!
//! ```typescript
//! import { JsGridEditor } from '@gridslice/wasm';
//!
//! const editor = new JsGridEditor(undefined);
//! editor.set_container_size(canvas.width, canvas.height);
//! editor.load_file(file.name, file.type, new Uint8Array(await file.arrayBuffer()));
//!
//! canvas.onpointermove = (e) => editor.pointer_move(e.offsetX, e.offsetY);
//!
//! function frame() {
//!   const commands = editor.render_commands();
//!   if (commands) replay(ctx, commands, img);
//!   requestAnimationFrame(frame);
//! }
//! ```

use crate::export::JsExportJob;
use crate::types::{js_error, JsRasterFrame};
use gridslice_core::render::{DisplayList, PreviewStyle, RasterSurface};
use gridslice_core::{ConfigError, EditorConfig, EditorSession, ExportFormat, Point, ScaleAxis};
use wasm_bindgen::prelude::*;

/// Interactive grid editor.
#[wasm_bindgen]
pub struct JsGridEditor {
    session: EditorSession,
    style: PreviewStyle,
}

#[wasm_bindgen]
impl JsGridEditor {
    /// Create an editor.
    ///
    /// # Arguments
    /// * `config` - Partial `EditorConfig` object, or `undefined` for defaults
    ///
    /// # Errors
    /// Returns an error if `config` does not deserialize or has unusable
    /// bounds, e.g. `min > max` for a scale range.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsGridEditor, JsValue> {
        let config: EditorConfig = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid editor config: {}", e)))?
        };
        JsGridEditor::try_with_config(config).map_err(js_error)
    }

    // ------------------------------------------------------------------
    // Image lifecycle
    // ------------------------------------------------------------------

    /// Load an uploaded file. The MIME type must start with `image/`.
    ///
    /// On error the editor keeps its previous image and state.
    pub fn load_file(&mut self, name: &str, mime: &str, bytes: &[u8]) -> Result<(), JsValue> {
        self.session.load_file(name, mime, bytes).map_err(js_error)
    }

    /// Drop the image and cancel any running export.
    pub fn close(&mut self) {
        self.session.close();
    }

    #[wasm_bindgen(getter)]
    pub fn has_image(&self) -> bool {
        self.session.has_image()
    }

    #[wasm_bindgen(getter)]
    pub fn image_width(&self) -> u32 {
        self.session.image().map_or(0, |i| i.width)
    }

    #[wasm_bindgen(getter)]
    pub fn image_height(&self) -> u32 {
        self.session.image().map_or(0, |i| i.height)
    }

    pub fn set_container_size(&mut self, width: f64, height: f64) -> bool {
        self.session.set_container_size(width, height)
    }

    // ------------------------------------------------------------------
    // Pointer and wheel
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.session.pointer_down(Point::new(x, y));
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.session.pointer_move(Point::new(x, y))
    }

    pub fn pointer_up(&mut self) {
        self.session.pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.session.pointer_leave();
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
        self.session.pan_by(dx, dy)
    }

    /// Wheel event; pass `WheelEvent.deltaY`.
    pub fn wheel(&mut self, delta_y: f64) -> bool {
        self.session.wheel(delta_y)
    }

    // ------------------------------------------------------------------
    // Scales
    // ------------------------------------------------------------------

    pub fn set_scale_global(&mut self, value: f64) -> bool {
        self.session.set_scale_global(value)
    }

    pub fn set_scale_x(&mut self, value: f64) -> bool {
        self.session.set_scale_x(value)
    }

    pub fn set_scale_y(&mut self, value: f64) -> bool {
        self.session.set_scale_y(value)
    }

    /// Slider +/- button.
    ///
    /// # Arguments
    /// * `axis` - "global", "x" or "y"
    /// * `direction` - positive to increase, negative to decrease
    pub fn step_scale(&mut self, axis: &str, direction: i32) -> Result<bool, JsValue> {
        let axis = parse_axis(axis)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown scale axis: {}", axis)))?;
        Ok(self.session.step_scale(axis, direction))
    }

    pub fn reset(&mut self) -> bool {
        self.session.reset()
    }

    #[wasm_bindgen(getter)]
    pub fn scale_global(&self) -> f64 {
        self.session.transform().scale_global
    }

    #[wasm_bindgen(getter)]
    pub fn scale_x(&self) -> f64 {
        self.session.transform().scale_x
    }

    #[wasm_bindgen(getter)]
    pub fn scale_y(&self) -> f64 {
        self.session.transform().scale_y
    }

    #[wasm_bindgen(getter)]
    pub fn position_x(&self) -> f64 {
        self.session.transform().position.x
    }

    #[wasm_bindgen(getter)]
    pub fn position_y(&self) -> f64 {
        self.session.transform().position.y
    }

    // ------------------------------------------------------------------
    // Grid
    // ------------------------------------------------------------------

    pub fn set_rows(&mut self, rows: u32) -> bool {
        self.session.set_rows(rows)
    }

    pub fn set_cols(&mut self, cols: u32) -> bool {
        self.session.set_cols(cols)
    }

    pub fn increment_rows(&mut self) -> bool {
        self.session.increment_rows()
    }

    pub fn decrement_rows(&mut self) -> bool {
        self.session.decrement_rows()
    }

    pub fn increment_cols(&mut self) -> bool {
        self.session.increment_cols()
    }

    pub fn decrement_cols(&mut self) -> bool {
        self.session.decrement_cols()
    }

    #[wasm_bindgen(getter)]
    pub fn rows(&self) -> u32 {
        self.session.grid().rows
    }

    #[wasm_bindgen(getter)]
    pub fn cols(&self) -> u32 {
        self.session.grid().cols
    }

    #[wasm_bindgen(getter)]
    pub fn total_slices(&self) -> u32 {
        self.session.total_slices()
    }

    // ------------------------------------------------------------------
    // Export settings and names
    // ------------------------------------------------------------------

    pub fn set_prefix(&mut self, prefix: &str) {
        self.session.set_prefix(prefix);
    }

    pub fn set_suffix(&mut self, suffix: &str) {
        self.session.set_suffix(suffix);
    }

    /// Set the output format: "png", "jpg" or "webp".
    pub fn set_format(&mut self, format: &str) -> Result<(), JsValue> {
        let parsed = ExportFormat::from_name(format)
            .ok_or_else(|| JsValue::from_str(&format!("Unsupported export format: {}", format)))?;
        self.session.set_format(parsed);
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn format(&self) -> String {
        self.session.settings().format.extension().to_string()
    }

    /// Name of the first slice, or `undefined` without an image.
    pub fn preview_file_name(&self) -> Option<String> {
        self.session.preview_file_name()
    }

    pub fn archive_name(&self) -> Option<String> {
        self.session.archive_name()
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// `{x, y, width, height}` of the grid frame, or `null`.
    pub fn frame_rect(&self) -> Result<JsValue, JsValue> {
        to_js_or_null(self.session.frame_rect().map(|f| f.to_rect()))
    }

    /// `{cx, cy, draw_w, draw_h}` of the drawn image, or `null`.
    pub fn render_rect(&self) -> Result<JsValue, JsValue> {
        to_js_or_null(self.session.render_rect())
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Switch between the dark and light mask.
    pub fn set_dark_theme(&mut self, dark: bool) {
        self.style = if dark {
            PreviewStyle::dark()
        } else {
            PreviewStyle::light()
        };
        self.session.request_redraw();
    }

    /// Force the next render call to draw.
    pub fn request_redraw(&mut self) -> bool {
        self.session.request_redraw()
    }

    #[wasm_bindgen(getter)]
    pub fn redraw_pending(&self) -> bool {
        self.session.redraw_pending()
    }

    /// Display list for this frame, or `undefined` when nothing changed.
    ///
    /// Each command is `{op, ...}` with `op` one of `clear`, `drawImage`,
    /// `fillEvenOdd`, `strokeLine`, `strokeRect`.
    pub fn render_commands(&mut self) -> Result<JsValue, JsValue> {
        let (width, height) = self.session.container_size();
        let mut list = DisplayList::new(width, height);
        if !self.session.render_if_pending(&mut list, &self.style) {
            return Ok(JsValue::UNDEFINED);
        }
        serde_wasm_bindgen::to_value(list.commands()).map_err(js_error)
    }

    /// Software-rendered frame, or `undefined` when nothing changed.
    pub fn render_pixels(&mut self) -> Option<JsRasterFrame> {
        if !self.session.redraw_pending() {
            return None;
        }
        let mut surface = self.raster_surface();
        self.session
            .render_if_pending(&mut surface, &self.style)
            .then(|| JsRasterFrame::from_surface(surface))
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Start a step-wise export. Cancels any export already running.
    pub fn start_export(&mut self) -> Result<JsExportJob, JsValue> {
        self.session
            .start_export()
            .map(JsExportJob::from_job)
            .map_err(js_error)
    }

    pub fn cancel_export(&mut self) -> bool {
        self.session.cancel_export()
    }
}

impl JsGridEditor {
    /// Like [`JsGridEditor::with_config`], rejecting an invalid config.
    pub fn try_with_config(config: EditorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            session: EditorSession::new(config),
            style: PreviewStyle::default(),
        }
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    fn raster_surface(&self) -> RasterSurface {
        let (width, height) = self.session.container_size();
        let dim = |v: f64| if v.is_finite() && v > 0.0 { v.round() as u32 } else { 0 };
        RasterSurface::new(dim(width), dim(height))
    }
}

fn parse_axis(name: &str) -> Option<ScaleAxis> {
    match name.trim().to_ascii_lowercase().as_str() {
        "global" | "scale" => Some(ScaleAxis::Global),
        "x" | "scale_x" => Some(ScaleAxis::X),
        "y" | "scale_y" => Some(ScaleAxis::Y),
        _ => None,
    }
}

fn to_js_or_null<T: serde::Serialize>(value: Option<T>) -> Result<JsValue, JsValue> {
    match value {
        Some(v) => serde_wasm_bindgen::to_value(&v).map_err(js_error),
        None => Ok(JsValue::NULL),
    }
}

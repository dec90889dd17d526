//! One editing session: a loaded image, the interactive state and the
//! pending export.
//!
//! All mutations are synchronous. Each one that changes what the preview
//! shows requests a redraw; the host draws from its animation-frame callback
//! with [`EditorSession::render_if_pending`], so bursts of pointer events
//! cost one frame.

use std::sync::Arc;

use thiserror::Error;

use crate::config::EditorConfig;
use crate::controller::{ScaleAxis, TransformController};
use crate::decode::{decode_image, validate_mime, DecodeError, SourceImage};
use crate::export::{
    base_name, CancelToken, ExportError, ExportFormat, ExportJob, ExportRequest, ExportSettings,
};
use crate::geometry::{
    compute_frame_rect_with_fill, compute_render_rect, FrameRect, GridGeometry, RenderRect,
};
use crate::render::{render_preview, PreviewStyle, PreviewSurface, RedrawScheduler};
use crate::{GridConfig, Point, TransformState};

/// Errors surfaced to the host by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("No image loaded")]
    NoImage,
}

#[derive(Debug, Clone)]
struct LoadedImage {
    file_name: String,
    image: Arc<SourceImage>,
}

/// The editor state behind one open image.
#[derive(Debug)]
pub struct EditorSession {
    config: EditorConfig,
    controller: TransformController,
    loaded: Option<LoadedImage>,
    container: (f64, f64),
    settings: ExportSettings,
    scheduler: RedrawScheduler,
    export_cancel: Option<CancelToken>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            controller: TransformController::new(config.clone()),
            settings: Self::default_settings(&config),
            config,
            loaded: None,
            container: (0.0, 0.0),
            scheduler: RedrawScheduler::new(),
            export_cancel: None,
        }
    }

    fn default_settings(config: &EditorConfig) -> ExportSettings {
        ExportSettings {
            quality: config.export_quality,
            ..ExportSettings::default()
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn controller(&self) -> &TransformController {
        &self.controller
    }

    pub fn transform(&self) -> &TransformState {
        self.controller.transform()
    }

    pub fn grid(&self) -> GridConfig {
        self.controller.grid()
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // Image lifecycle
    // ------------------------------------------------------------------

    /// Validate, decode and install a new source image.
    ///
    /// On any error the session is left exactly as it was. On success the
    /// transform, grid and export settings return to their defaults.
    pub fn load_file(&mut self, name: &str, mime: &str, bytes: &[u8]) -> Result<(), SessionError> {
        validate_mime(mime).inspect_err(|e| log::warn!("Rejected {}: {}", name, e))?;
        let image = decode_image(bytes).inspect_err(|e| log::warn!("Failed to load {}: {}", name, e))?;

        self.cancel_export();
        log::info!("Loaded {} ({}x{})", name, image.width, image.height);
        self.loaded = Some(LoadedImage {
            file_name: name.to_string(),
            image: Arc::new(image),
        });
        self.controller = TransformController::new(self.config.clone());
        self.settings = Self::default_settings(&self.config);
        self.scheduler.request();
        Ok(())
    }

    /// Drop the image and abandon any running export.
    pub fn close(&mut self) {
        self.cancel_export();
        if self.loaded.take().is_some() {
            log::info!("Closed editor session");
        }
        self.controller.pointer_up();
        self.scheduler.request();
    }

    pub fn has_image(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn image(&self) -> Option<&SourceImage> {
        self.loaded.as_ref().map(|l| l.image.as_ref())
    }

    pub fn file_name(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.file_name.as_str())
    }

    /// Resize the preview surface.
    pub fn set_container_size(&mut self, width: f64, height: f64) -> bool {
        if self.container == (width, height) {
            return false;
        }
        self.container = (width, height);
        self.scheduler.request();
        true
    }

    pub fn container_size(&self) -> (f64, f64) {
        self.container
    }

    // ------------------------------------------------------------------
    // Controller passthrough
    // ------------------------------------------------------------------

    fn changed(&mut self, changed: bool) -> bool {
        if changed {
            self.scheduler.request();
        }
        changed
    }

    pub fn pointer_down(&mut self, pointer: Point) {
        self.controller.pointer_down(pointer);
    }

    pub fn pointer_move(&mut self, pointer: Point) -> bool {
        let changed = self.controller.pointer_move(pointer);
        self.changed(changed)
    }

    pub fn pointer_up(&mut self) {
        self.controller.pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.controller.pointer_leave();
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
        let changed = self.controller.pan_by(dx, dy);
        self.changed(changed)
    }

    pub fn wheel(&mut self, delta_y: f64) -> bool {
        let changed = self.controller.wheel(delta_y);
        self.changed(changed)
    }

    pub fn nudge_scale(&mut self, delta: f64) -> bool {
        let changed = self.controller.nudge_scale(delta);
        self.changed(changed)
    }

    pub fn set_scale_global(&mut self, value: f64) -> bool {
        self.set_scale(ScaleAxis::Global, value)
    }

    pub fn set_scale_x(&mut self, value: f64) -> bool {
        self.set_scale(ScaleAxis::X, value)
    }

    pub fn set_scale_y(&mut self, value: f64) -> bool {
        self.set_scale(ScaleAxis::Y, value)
    }

    pub fn set_scale(&mut self, axis: ScaleAxis, value: f64) -> bool {
        let changed = self.controller.set_scale(axis, value);
        self.changed(changed)
    }

    pub fn step_scale(&mut self, axis: ScaleAxis, direction: i32) -> bool {
        let changed = self.controller.step_scale(axis, direction);
        self.changed(changed)
    }

    pub fn reset(&mut self) -> bool {
        let changed = self.controller.reset();
        self.changed(changed)
    }

    pub fn set_rows(&mut self, rows: u32) -> bool {
        let changed = self.controller.set_rows(rows);
        self.changed(changed)
    }

    pub fn set_cols(&mut self, cols: u32) -> bool {
        let changed = self.controller.set_cols(cols);
        self.changed(changed)
    }

    pub fn increment_rows(&mut self) -> bool {
        let changed = self.controller.increment_rows();
        self.changed(changed)
    }

    pub fn decrement_rows(&mut self) -> bool {
        let changed = self.controller.decrement_rows();
        self.changed(changed)
    }

    pub fn increment_cols(&mut self) -> bool {
        let changed = self.controller.increment_cols();
        self.changed(changed)
    }

    pub fn decrement_cols(&mut self) -> bool {
        let changed = self.controller.decrement_cols();
        self.changed(changed)
    }

    // ------------------------------------------------------------------
    // Export settings
    // ------------------------------------------------------------------

    pub fn set_prefix(&mut self, prefix: &str) {
        self.settings.prefix = prefix.to_string();
    }

    pub fn set_suffix(&mut self, suffix: &str) {
        self.settings.suffix = suffix.to_string();
    }

    pub fn set_format(&mut self, format: ExportFormat) {
        self.settings.format = format;
    }

    // ------------------------------------------------------------------
    // Derived geometry
    // ------------------------------------------------------------------

    /// Frame for the current container, once an image is loaded.
    pub fn frame_rect(&self) -> Option<FrameRect> {
        let image = self.image()?;
        compute_frame_rect_with_fill(
            self.container.0,
            self.container.1,
            image.width,
            image.height,
            self.config.frame_fill,
        )
    }

    pub fn render_rect(&self) -> Option<RenderRect> {
        let frame = self.frame_rect()?;
        Some(compute_render_rect(&frame, self.controller.transform()))
    }

    pub fn geometry(&self) -> Option<GridGeometry> {
        let frame = self.frame_rect()?;
        let image = self.image()?;
        GridGeometry::new(
            frame,
            *self.controller.transform(),
            image.dimensions(),
            self.controller.grid(),
        )
    }

    fn base_name(&self) -> Option<&str> {
        self.file_name().map(base_name)
    }

    /// Name the first slice will get, for display next to the settings.
    pub fn preview_file_name(&self) -> Option<String> {
        self.base_name().map(|base| self.settings.slice_name(base, 1))
    }

    pub fn archive_name(&self) -> Option<String> {
        self.base_name().map(|base| self.settings.archive_name(base))
    }

    pub fn total_slices(&self) -> u32 {
        self.controller.grid().cell_count()
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    pub fn request_redraw(&mut self) -> bool {
        self.scheduler.request()
    }

    pub fn redraw_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn scheduler(&self) -> &RedrawScheduler {
        &self.scheduler
    }

    /// Draw the preview unconditionally. Without an image or a usable
    /// container the surface is only cleared.
    pub fn render<S: PreviewSurface + ?Sized>(&self, surface: &mut S, style: &PreviewStyle) {
        match (self.image(), self.frame_rect()) {
            (Some(image), Some(frame)) => render_preview(
                surface,
                image,
                &frame,
                self.controller.transform(),
                self.controller.grid(),
                style,
            ),
            _ => surface.clear(),
        }
    }

    /// Draw if a redraw was requested since the last frame.
    pub fn render_if_pending<S: PreviewSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        style: &PreviewStyle,
    ) -> bool {
        if !self.scheduler.take_pending() {
            return false;
        }
        self.render(surface, style);
        true
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Snapshot the current state into an export request.
    pub fn export_request(&self) -> Result<ExportRequest, SessionError> {
        let loaded = self.loaded.as_ref().ok_or(SessionError::NoImage)?;
        let frame = self.frame_rect().ok_or(ExportError::InvalidGeometry)?;
        Ok(ExportRequest {
            image: Arc::clone(&loaded.image),
            file_name: loaded.file_name.clone(),
            frame,
            transform: *self.controller.transform(),
            grid: self.controller.grid(),
            settings: self.settings.clone(),
        })
    }

    /// Start a step-wise export of the current grid.
    ///
    /// Any export already running is cancelled first.
    pub fn start_export(&mut self) -> Result<ExportJob, SessionError> {
        let request = self.export_request()?;
        self.cancel_export();
        let token = CancelToken::new();
        let job = ExportJob::new(request, token.clone())?;
        self.export_cancel = Some(token);
        Ok(job)
    }

    /// Cancel the running export, if any.
    pub fn cancel_export(&mut self) -> bool {
        match self.export_cancel.take() {
            Some(token) => {
                token.cancel();
                log::info!("Export cancelled");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DisplayList, DrawCommand};
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let pixels: Vec<u8> = (0..width * height)
            .flat_map(|i| [(i % 256) as u8, 40, 90, 255])
            .collect();
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(&pixels, width, height, ExtendedColorType::Rgba8)
            .unwrap();
        out
    }

    fn loaded_session() -> EditorSession {
        let mut session = EditorSession::default();
        session.set_container_size(800.0, 600.0);
        session
            .load_file("beach.png", "image/png", &png_bytes(120, 90))
            .unwrap();
        session
    }

    #[test]
    fn test_text_file_leaves_state_untouched() {
        let mut session = loaded_session();
        session.set_rows(2);
        session.pan_by(5.0, 5.0);
        session.set_prefix("ig_");
        let before_transform = *session.transform();
        let before_grid = session.grid();

        let err = session
            .load_file("notes.txt", "text/plain", b"hello")
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Decode(DecodeError::InvalidFileType { .. })
        ));
        assert_eq!(session.file_name(), Some("beach.png"));
        assert_eq!(*session.transform(), before_transform);
        assert_eq!(session.grid(), before_grid);
        assert_eq!(session.settings().prefix, "ig_");
    }

    #[test]
    fn test_corrupt_image_leaves_state_untouched() {
        let mut session = loaded_session();
        let err = session
            .load_file("broken.png", "image/png", &[0x89, b'P', b'N', b'G', 0, 1])
            .unwrap_err();
        assert!(matches!(err, SessionError::Decode(_)));
        assert_eq!(session.image().map(|i| i.dimensions()), Some((120, 90)));
    }

    #[test]
    fn test_load_resets_state() {
        let mut session = loaded_session();
        session.set_cols(2);
        session.wheel(-500.0);
        session.set_suffix("_x");

        session
            .load_file("other.png", "image/png", &png_bytes(40, 40))
            .unwrap();
        assert!(session.transform().is_identity());
        assert_eq!(session.grid(), GridConfig::default());
        assert_eq!(session.settings().suffix, "");
    }

    #[test]
    fn test_geometry_requires_image_and_container() {
        let mut session = EditorSession::default();
        assert!(session.frame_rect().is_none());
        session.set_container_size(800.0, 600.0);
        assert!(session.geometry().is_none());

        session
            .load_file("a.png", "image/png", &png_bytes(120, 90))
            .unwrap();
        let frame = session.frame_rect().unwrap();
        assert!((frame.width - 760.0).abs() < 1e-9);
        assert!((frame.height - 570.0).abs() < 1e-9);
        assert!(session.geometry().is_some());
    }

    #[test]
    fn test_names() {
        let mut session = loaded_session();
        session.set_prefix("p_");
        session.set_suffix("_s");
        session.set_format(ExportFormat::Webp);
        assert_eq!(session.preview_file_name().as_deref(), Some("p_beach_s_1.webp"));
        assert_eq!(session.archive_name().as_deref(), Some("p_beach_s_grid.zip"));
        assert_eq!(session.total_slices(), 18);
    }

    #[test]
    fn test_redraws_coalesce_per_frame() {
        let mut session = loaded_session();
        let mut list = DisplayList::new(800.0, 600.0);
        let style = PreviewStyle::default();

        assert!(session.render_if_pending(&mut list, &style));
        assert!(!session.render_if_pending(&mut list, &style));

        session.pointer_down(Point::new(10.0, 10.0));
        for i in 0..20 {
            session.pointer_move(Point::new(10.0 + i as f64, 10.0));
        }
        session.pointer_up();
        assert!(session.render_if_pending(&mut list, &style));
        assert!(!session.render_if_pending(&mut list, &style));
        assert!(matches!(list.commands()[1], DrawCommand::DrawImage { .. }));
    }

    #[test]
    fn test_unchanged_input_does_not_request_redraw() {
        let mut session = loaded_session();
        let mut list = DisplayList::new(800.0, 600.0);
        session.render_if_pending(&mut list, &PreviewStyle::default());

        assert!(!session.reset());
        assert!(!session.set_scale_global(f64::NAN));
        assert!(!session.redraw_pending());
        assert!(session.step_scale(ScaleAxis::X, 1));
        assert!(session.redraw_pending());
    }

    #[test]
    fn test_render_without_image_only_clears() {
        let mut session = EditorSession::default();
        session.set_container_size(100.0, 100.0);
        let mut list = DisplayList::new(100.0, 100.0);
        assert!(session.render_if_pending(&mut list, &PreviewStyle::dark()));
        assert_eq!(list.commands().len(), 1);
    }

    #[test_log::test]
    fn test_export_flow() {
        let mut session = loaded_session();
        session.set_rows(2);
        session.set_cols(3);
        let bundle = session.start_export().unwrap().finish().unwrap();
        assert_eq!(bundle.len(), 6);
        assert_eq!(bundle.archive_name(), "beach_grid.zip");
        assert_eq!(bundle.slices()[0].file_name, "beach_1.png");
    }

    #[test]
    fn test_export_without_image() {
        let mut session = EditorSession::default();
        assert!(matches!(session.start_export(), Err(SessionError::NoImage)));
    }

    #[test]
    fn test_close_cancels_export() {
        let mut session = loaded_session();
        let mut job = session.start_export().unwrap();
        job.step().unwrap();

        session.close();
        assert!(!session.has_image());
        assert!(matches!(job.step(), Err(ExportError::Cancelled)));
    }

    #[test]
    fn test_new_export_cancels_previous() {
        let mut session = loaded_session();
        let first = session.start_export().unwrap();
        let _second = session.start_export().unwrap();
        assert!(first.cancel_token().is_cancelled());
    }
}

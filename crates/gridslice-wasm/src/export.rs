//! Step-wise export WASM bindings.
//!
//! The host drives a `JsExportJob` from its event loop so the page stays
//! responsive, then hands the finished slices to its zip writer:
//!
//! ```typescript
//! const job = editor.start_export();
//! while (job.step()) {
//!   progress.value = job.completed / job.total;
//!   await new Promise((r) => setTimeout(r));
//! }
//! const zip = new JSZip();
//! const archiveName = job.finish((path, bytes) => zip.file(path, bytes));
//! saveAs(await zip.generateAsync({ type: 'blob' }), archiveName);
//! ```

use crate::types::js_error;
use gridslice_core::export::{ArchiveError, ArchiveSink, ExportJob};
use js_sys::{Function, Uint8Array};
use wasm_bindgen::prelude::*;

/// A running export.
#[wasm_bindgen]
pub struct JsExportJob {
    job: Option<ExportJob>,
    total: u32,
}

#[wasm_bindgen]
impl JsExportJob {
    /// Encode the next cell. Returns `false` when nothing was left to encode.
    ///
    /// # Errors
    /// Returns an error if the cell fails, the job was cancelled, or
    /// `finish` already ran. The job cannot be resumed after an error.
    pub fn step(&mut self) -> Result<bool, JsValue> {
        let job = self.job_mut()?;
        Ok(job.step().map_err(js_error)?.is_some())
    }

    /// Number of cells in the grid.
    #[wasm_bindgen(getter)]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Number of cells encoded so far.
    #[wasm_bindgen(getter)]
    pub fn completed(&self) -> u32 {
        self.job.as_ref().map_or(0, |j| j.completed())
    }

    /// Abandon the export. Any later `step` or `finish` fails.
    pub fn cancel(&self) {
        if let Some(job) = &self.job {
            job.cancel_token().cancel();
        }
    }

    /// Encode any remaining cells, then call `emit(path, bytes)` once per
    /// slice in row-major order.
    ///
    /// `emit` is only called after every cell encoded. Returns the archive
    /// file name.
    pub fn finish(&mut self, emit: &Function) -> Result<String, JsValue> {
        let job = self
            .job
            .take()
            .ok_or_else(|| JsValue::from_str("Export already finished"))?;
        let bundle = job.finish().map_err(js_error)?;

        let mut sink = JsArchiveSink { emit };
        bundle.write_to(&mut sink).map_err(js_error)?;
        Ok(bundle.archive_name().to_string())
    }
}

impl JsExportJob {
    pub(crate) fn from_job(job: ExportJob) -> Self {
        Self {
            total: job.total(),
            job: Some(job),
        }
    }

    fn job_mut(&mut self) -> Result<&mut ExportJob, JsValue> {
        self.job
            .as_mut()
            .ok_or_else(|| JsValue::from_str("Export already finished"))
    }
}

/// Forwards archive entries to a JS callback.
struct JsArchiveSink<'a> {
    emit: &'a Function,
}

impl ArchiveSink for JsArchiveSink<'_> {
    fn add_file(&mut self, path: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        let data = Uint8Array::from(bytes);
        self.emit
            .call2(&JsValue::NULL, &JsValue::from_str(path), &data.into())
            .map(|_| ())
            .map_err(|e| ArchiveError::WriteFailed {
                path: path.to_string(),
                reason: e.as_string().unwrap_or_else(|| format!("{:?}", e)),
            })
    }
}

/// WASM-specific tests that require JsValue.
///
/// Use `wasm-pack test` to run these.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::editor::JsGridEditor;
    use gridslice_core::{EditorConfig, ExportFormat};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn editor_with_image() -> JsGridEditor {
        let pixels = vec![90u8; 60 * 40 * 4];
        let png =
            gridslice_core::encode::encode_rgba(&pixels, 60, 40, ExportFormat::Png, 95).unwrap();
        let mut editor = JsGridEditor::with_config(EditorConfig::default());
        editor.set_container_size(600.0, 400.0);
        editor.load_file("shot.png", "image/png", &png).unwrap();
        editor.set_rows(2);
        editor.set_cols(2);
        editor
    }

    #[wasm_bindgen_test]
    fn test_step_and_finish() {
        let mut editor = editor_with_image();
        let mut job = editor.start_export().unwrap();
        assert_eq!(job.total(), 4);
        assert!(job.step().unwrap());
        assert_eq!(job.completed(), 1);

        let paths = js_sys::Array::new();
        let collect = Function::new_with_args("paths, path, bytes", "paths.push(path)")
            .bind1(&JsValue::NULL, &paths);
        let name = job.finish(&collect).unwrap();

        assert_eq!(name, "shot_grid.zip");
        assert_eq!(paths.length(), 4);
        assert_eq!(paths.get(0).as_string().unwrap(), "grid_slices/shot_1.png");
        assert!(job.step().is_err());
    }

    #[wasm_bindgen_test]
    fn test_cancelled_job_never_emits() {
        let mut editor = editor_with_image();
        let mut job = editor.start_export().unwrap();
        job.cancel();

        let emit = Function::new_with_args("path, bytes", "throw new Error('emitted')");
        assert!(job.finish(&emit).is_err());
    }
}

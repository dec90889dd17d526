//! Step-wise, cancellable export.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::naming::{base_name, format_bytes, ExportSettings, SLICE_FOLDER};
use super::rasterize::rasterize_cell;
use super::{ArchiveError, ExportError};
use crate::decode::SourceImage;
use crate::encode::{encode_rgba, ExportFormat};
use crate::geometry::{FrameRect, GridCell, GridGeometry};
use crate::{GridConfig, TransformState};

/// Shared flag that abandons a running export.
///
/// Clones share the flag, so the UI side can keep one and cancel while a
/// job (or a rayon pool) holds another.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Everything needed to export one grid, captured at export time.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub image: Arc<SourceImage>,
    /// Uploaded file name; its last extension is stripped for slice names
    pub file_name: String,
    /// The frame the user last saw
    pub frame: FrameRect,
    pub transform: TransformState,
    pub grid: GridConfig,
    pub settings: ExportSettings,
}

impl ExportRequest {
    pub fn base_name(&self) -> &str {
        base_name(&self.file_name)
    }

    pub fn archive_name(&self) -> String {
        self.settings.archive_name(self.base_name())
    }

    fn geometry(&self) -> Result<GridGeometry, ExportError> {
        if self.image.is_empty() {
            return Err(ExportError::NoImage);
        }
        GridGeometry::new(
            self.frame,
            self.transform,
            self.image.dimensions(),
            self.grid,
        )
        .ok_or(ExportError::InvalidGeometry)
    }
}

/// One encoded cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    /// 1-based, row-major
    pub index: u32,
    pub row: u32,
    pub col: u32,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl Slice {
    /// Path of this slice inside the archive.
    pub fn archive_path(&self) -> String {
        format!("{}/{}", SLICE_FOLDER, self.file_name)
    }
}

/// Receives finished slices, e.g. a zip writer owned by the host.
///
/// Entries arrive in row-major order and only after the whole grid encoded
/// successfully.
pub trait ArchiveSink {
    fn add_file(&mut self, path: &str, bytes: &[u8]) -> Result<(), ArchiveError>;

    /// Called once after the last entry.
    fn finish(&mut self) -> Result<(), ArchiveError> {
        Ok(())
    }
}

/// In-memory sink collecting `(path, bytes)` pairs.
impl ArchiveSink for Vec<(String, Vec<u8>)> {
    fn add_file(&mut self, path: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        self.push((path.to_string(), bytes.to_vec()));
        Ok(())
    }
}

/// A complete export: every cell encoded, in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    archive_name: String,
    format: ExportFormat,
    slices: Vec<Slice>,
}

impl ExportBundle {
    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub fn into_slices(self) -> Vec<Slice> {
        self.slices
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Sum of encoded slice sizes.
    pub fn total_bytes(&self) -> u64 {
        self.slices.iter().map(|s| s.bytes.len() as u64).sum()
    }

    /// `(archive path, bytes)` pairs in row-major order.
    pub fn entries(&self) -> impl Iterator<Item = (String, &[u8])> + '_ {
        self.slices
            .iter()
            .map(|s| (s.archive_path(), s.bytes.as_slice()))
    }

    /// Hand every entry to `sink`, then finish it.
    pub fn write_to<S: ArchiveSink + ?Sized>(&self, sink: &mut S) -> Result<(), ExportError> {
        for (path, bytes) in self.entries() {
            sink.add_file(&path, bytes).inspect_err(|e| {
                log::warn!("Archive write failed: {}", e);
            })?;
        }
        sink.finish()?;
        log::info!(
            "Wrote {} ({} entries, {})",
            self.archive_name,
            self.slices.len(),
            format_bytes(self.total_bytes())
        );
        Ok(())
    }
}

/// Rasterize and encode one cell.
fn encode_cell(
    image: &SourceImage,
    settings: &ExportSettings,
    base: &str,
    cell: GridCell,
) -> Result<Slice, ExportError> {
    let (width, height) = cell
        .rect
        .output_size()
        .ok_or(ExportError::DegenerateCell {
            index: cell.index,
            width: cell.rect.src_w,
            height: cell.rect.src_h,
        })?;

    let pixels =
        rasterize_cell(image, &cell.rect, width, height).ok_or(ExportError::CellTooLarge {
            index: cell.index,
            width,
            height,
        })?;
    let bytes = encode_rgba(&pixels, width, height, settings.format, settings.quality)
        .map_err(|source| ExportError::Encode {
            index: cell.index,
            source,
        })?;

    let file_name = settings.slice_name(base, cell.index);
    log::debug!(
        "Encoded {} ({}x{}, {} bytes)",
        file_name,
        width,
        height,
        bytes.len()
    );

    Ok(Slice {
        index: cell.index,
        row: cell.row,
        col: cell.col,
        file_name,
        width,
        height,
        bytes,
    })
}

/// Cooperative export: one cell per [`step`](Self::step), so a host event
/// loop can yield between cells.
#[derive(Debug)]
pub struct ExportJob {
    request: ExportRequest,
    geometry: GridGeometry,
    cancel: CancelToken,
    /// Next 1-based cell index to encode
    next: u32,
    slices: Vec<Slice>,
    aborted: bool,
}

impl ExportJob {
    /// Validate the request and prepare a job.
    pub fn new(request: ExportRequest, cancel: CancelToken) -> Result<Self, ExportError> {
        let geometry = request.geometry()?;
        log::info!(
            "Exporting {} cells ({}x{}) from {} as {}",
            geometry.cell_count(),
            request.grid.rows,
            request.grid.cols,
            request.file_name,
            request.settings.format.extension()
        );
        Ok(Self {
            slices: Vec::with_capacity(geometry.cell_count() as usize),
            request,
            geometry,
            cancel,
            next: 1,
            aborted: false,
        })
    }

    pub fn total(&self) -> u32 {
        self.geometry.cell_count()
    }

    pub fn completed(&self) -> u32 {
        self.slices.len() as u32
    }

    pub fn is_done(&self) -> bool {
        self.next > self.total()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn archive_name(&self) -> String {
        self.request.archive_name()
    }

    /// Encode the next cell.
    ///
    /// Returns the index just encoded, or `None` once all cells are done.
    /// After any error the job is dead and every later call fails.
    pub fn step(&mut self) -> Result<Option<u32>, ExportError> {
        if self.aborted {
            return Err(ExportError::Aborted);
        }
        if self.cancel.is_cancelled() {
            return Err(self.abort(ExportError::Cancelled));
        }
        if self.is_done() {
            return Ok(None);
        }

        let Some(cell) = self.geometry.cell_at_index(self.next) else {
            return Err(self.abort(ExportError::InvalidGeometry));
        };
        let base = self.request.base_name();
        match encode_cell(&self.request.image, &self.request.settings, base, cell) {
            Ok(slice) => {
                self.slices.push(slice);
                self.next += 1;
                Ok(Some(cell.index))
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    /// Run the remaining cells and produce the bundle.
    pub fn finish(mut self) -> Result<ExportBundle, ExportError> {
        while self.step()?.is_some() {}

        let bundle = ExportBundle {
            archive_name: self.request.archive_name(),
            format: self.request.settings.format,
            slices: self.slices,
        };
        log::info!(
            "Export complete: {} slices, {}",
            bundle.len(),
            format_bytes(bundle.total_bytes())
        );
        Ok(bundle)
    }

    fn abort(&mut self, error: ExportError) -> ExportError {
        log::warn!("Export aborted at cell {}: {}", self.next, error);
        self.aborted = true;
        self.slices.clear();
        error
    }
}

/// Export every cell sequentially.
pub fn export_grid(request: &ExportRequest) -> Result<ExportBundle, ExportError> {
    ExportJob::new(request.clone(), CancelToken::new())?.finish()
}

/// Export every cell on the rayon thread pool.
///
/// Cells are encoded in any order but the bundle is row-major. Cancellation
/// is checked before each cell.
#[cfg(feature = "parallel")]
pub fn export_grid_parallel(
    request: &ExportRequest,
    cancel: &CancelToken,
) -> Result<ExportBundle, ExportError> {
    use rayon::prelude::*;

    let geometry = request.geometry()?;
    let base = request.base_name();
    let cells: Vec<GridCell> = geometry.cells().collect();
    log::info!("Exporting {} cells in parallel", cells.len());

    let slices = cells
        .into_par_iter()
        .map(|cell| {
            if cancel.is_cancelled() {
                return Err(ExportError::Cancelled);
            }
            encode_cell(&request.image, &request.settings, base, cell)
        })
        .collect::<Result<Vec<_>, _>>()
        .inspect_err(|e| log::warn!("Parallel export failed: {}", e))?;

    Ok(ExportBundle {
        archive_name: request.archive_name(),
        format: request.settings.format,
        slices,
    })
}

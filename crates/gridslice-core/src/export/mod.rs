//! Slice export.
//!
//! For every cell, in row-major order:
//!
//! 1. Compute the cell's source rectangle against the frame last shown
//! 2. Rasterize it into a buffer of `round(piece_w) x round(piece_h)` pixels
//! 3. Encode in the chosen [`ExportFormat`]
//! 4. Name it `{prefix}{base}{suffix}_{index}.{ext}`
//!
//! The whole export fails on the first cell error: a bundle is only produced
//! once every cell has been encoded, and nothing reaches an [`ArchiveSink`]
//! before that.

mod job;
mod naming;
mod rasterize;

pub use crate::encode::ExportFormat;
pub use job::{
    export_grid, ArchiveSink, CancelToken, ExportBundle, ExportJob, ExportRequest, Slice,
};
#[cfg(feature = "parallel")]
pub use job::export_grid_parallel;
pub use naming::{
    base_name, format_bytes, ExportSettings, ARCHIVE_EXTENSION, DEFAULT_QUALITY, SLICE_FOLDER,
};
pub use rasterize::{cell_buffer_len, rasterize_cell, MAX_CELL_PIXELS, MAX_CELL_SIDE};

use crate::encode::EncodeError;
use thiserror::Error;

/// Errors reported by an archive collaborator.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to add {path} to archive: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Failed to finalize archive: {0}")]
    Finalize(String),
}

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No source image is loaded
    #[error("No image loaded")]
    NoImage,

    /// Frame or transform cannot produce cell rectangles
    #[error("Invalid export geometry: frame and transform must be finite and non-empty")]
    InvalidGeometry,

    /// A cell's piece rounds to less than one pixel
    #[error("Cell {index} is degenerate ({width:.3} x {height:.3} source pixels)")]
    DegenerateCell { index: u32, width: f64, height: f64 },

    /// A cell's output is larger than a single canvas can hold
    #[error(
        "Cell {index} is too large to export ({width} x {height} pixels, limit {} pixels)",
        MAX_CELL_PIXELS
    )]
    CellTooLarge { index: u32, width: u32, height: u32 },

    /// Encoding a cell failed
    #[error("Failed to encode cell {index}: {source}")]
    Encode {
        index: u32,
        #[source]
        source: EncodeError,
    },

    /// The job's cancel token was triggered
    #[error("Export cancelled")]
    Cancelled,

    /// An earlier step of the same job failed
    #[error("Export aborted after an earlier failure")]
    Aborted,

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

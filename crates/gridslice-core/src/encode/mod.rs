//! Image encoding for exported slices.
//!
//! This module provides:
//! - Encoding RGBA buffers to PNG, JPEG or WebP
//! - The [`ExportFormat`] enumeration shared with naming and the host UI
//!
//! # Examples
//!
//! ```ignore
//! use gridslice_core::encode::{encode_rgba, ExportFormat};
//!
//! let pixels = vec![128u8; 100 * 100 * 4]; // Gray, semi-transparent
//! let png = encode_rgba(&pixels, 100, 100, ExportFormat::Png, 95).unwrap();
//! println!("Encoded {} bytes", png.len());
//! ```

mod codec;

pub use codec::{encode_rgba, EncodeError, ExportFormat};

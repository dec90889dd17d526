//! GridSlice WASM - WebAssembly bindings for the grid editor
//!
//! This crate exposes gridslice-core to JavaScript/TypeScript. The page owns
//! layout, file intake and the zip writer; everything between the uploaded
//! bytes and the named slice buffers runs here.
//!
//! # Module Structure
//!
//! - `editor` - `JsGridEditor`, one editing session with preview rendering
//! - `export` - `JsExportJob`, step-wise cancellable export
//! - `types` - WASM-compatible wrapper types
//! - `logger` - Forwards `log` records to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsGridEditor, set_log_level } from '@gridslice/wasm';
//!
//! await init();
//! set_log_level('debug');
//!
//! const editor = new JsGridEditor(undefined);
//! editor.load_file(file.name, file.type, new Uint8Array(await file.arrayBuffer()));
//! ```

use wasm_bindgen::prelude::*;

mod editor;
mod export;
mod logger;
mod types;

// Re-export public types
pub use editor::JsGridEditor;
pub use export::JsExportJob;
pub use types::JsRasterFrame;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logger::install(log::LevelFilter::Info);
}

/// Change the console log level: "off", "error", "warn", "info", "debug"
/// or "trace".
#[wasm_bindgen]
pub fn set_log_level(level: &str) {
    log::set_max_level(logger::parse_level(level));
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Whether a file with this MIME type can be loaded.
#[wasm_bindgen]
pub fn is_supported_mime(mime: &str) -> bool {
    gridslice_core::validate_mime(mime).is_ok()
}

/// Human-readable size, e.g. `"1.5 KB"`.
#[wasm_bindgen]
pub fn format_bytes(bytes: f64) -> String {
    let bytes = if bytes.is_finite() && bytes > 0.0 {
        bytes as u64
    } else {
        0
    };
    gridslice_core::export::format_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_is_supported_mime() {
        assert!(is_supported_mime("image/png"));
        assert!(is_supported_mime("image/heic"));
        assert!(!is_supported_mime("text/plain"));
        assert!(!is_supported_mime(""));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(2048.0), "2 KB");
        assert_eq!(format_bytes(-1.0), "0 Bytes");
        assert_eq!(format_bytes(f64::NAN), "0 Bytes");
    }
}

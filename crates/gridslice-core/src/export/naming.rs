//! Output file naming and size formatting.

use serde::{Deserialize, Serialize};

use crate::encode::ExportFormat;

/// Folder inside the archive that holds every slice.
pub const SLICE_FOLDER: &str = "grid_slices";

/// Archive extension.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Default encoder quality (percent). Only the JPEG encoder uses it.
pub const DEFAULT_QUALITY: u8 = 95;

/// User-facing export options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Prepended to every file name
    pub prefix: String,
    /// Inserted between the base name and the cell index
    pub suffix: String,
    pub format: ExportFormat,
    /// Encoder quality, 1 to 100
    pub quality: u8,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            format: ExportFormat::default(),
            quality: DEFAULT_QUALITY,
        }
    }
}

impl ExportSettings {
    /// `{prefix}{base}{suffix}`
    pub fn stem(&self, base: &str) -> String {
        format!("{}{}{}", self.prefix, base, self.suffix)
    }

    /// File name of the slice with 1-based `index`.
    pub fn slice_name(&self, base: &str, index: u32) -> String {
        format!("{}_{}.{}", self.stem(base), index, self.format.extension())
    }

    /// Path of the slice inside the archive.
    pub fn slice_path(&self, base: &str, index: u32) -> String {
        format!("{}/{}", SLICE_FOLDER, self.slice_name(base, index))
    }

    pub fn archive_name(&self, base: &str) -> String {
        format!("{}_grid.{}", self.stem(base), ARCHIVE_EXTENSION)
    }
}

/// Strip the last extension from an uploaded file name.
///
/// Only a trailing `.ext` with at least one character and no `/` or `.` is
/// removed: `"photo.final.png"` becomes `"photo.final"`, `"noext"` and
/// `"trailing."` are returned unchanged.
pub fn base_name(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(dot) => {
            let ext = &file_name[dot + 1..];
            if ext.is_empty() || ext.contains('/') {
                file_name
            } else {
                &file_name[..dot]
            }
        }
        None => file_name,
    }
}

/// Human-readable byte count: `"0 Bytes"`, `"1.5 KB"`, `"2 MB"`.
///
/// Base 1024, at most two decimals with trailing zeros dropped.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("photo.png"), "photo");
        assert_eq!(base_name("photo.final.jpeg"), "photo.final");
        assert_eq!(base_name("noext"), "noext");
        assert_eq!(base_name("trailing."), "trailing.");
        assert_eq!(base_name("dir.v2/file"), "dir.v2/file");
        assert_eq!(base_name(".hidden"), "");
    }

    #[test]
    fn test_row_major_names_2x3() {
        let settings = ExportSettings {
            prefix: "ig_".into(),
            suffix: "_post".into(),
            format: ExportFormat::Jpeg,
            ..Default::default()
        };
        let names: Vec<String> = (1..=6).map(|i| settings.slice_name("beach", i)).collect();
        assert_eq!(
            names,
            [
                "ig_beach_post_1.jpg",
                "ig_beach_post_2.jpg",
                "ig_beach_post_3.jpg",
                "ig_beach_post_4.jpg",
                "ig_beach_post_5.jpg",
                "ig_beach_post_6.jpg",
            ]
        );
        assert_eq!(settings.archive_name("beach"), "ig_beach_post_grid.zip");
        assert_eq!(
            settings.slice_path("beach", 4),
            "grid_slices/ig_beach_post_4.jpg"
        );
    }

    #[test]
    fn test_default_settings() {
        let settings = ExportSettings::default();
        assert_eq!(settings.quality, 95);
        assert_eq!(settings.slice_name("a", 1), "a_1.png");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(512), "512 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1_048_576), "1 MB");
        assert_eq!(format_bytes(1_234_567), "1.18 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3 GB");
    }
}

//! Loading image files into RGB8 buffers.
//!
//! Decoding goes through the `image` crate. Whatever the source pixel format
//! (indexed, RGBA, grayscale, 16-bit), the result is normalized to 8-bit RGB
//! before it reaches the extractor; alpha is dropped, not composited.

use crate::error::{AnalysisError, Result};
use crate::model::ImageMetadata;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Extensions accepted by [`load_image`], lowercase.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "gif", "tiff", "tif", "webp",
];

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A decoded image plus the facts captured while reading it.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub image: RgbImage,
    pub metadata: ImageMetadata,
}

/// Check if a path has one of the supported extensions
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Size of the file on disk in MiB
pub fn file_size_mb(path: &Path) -> Result<f64> {
    let meta = std::fs::metadata(path).map_err(|e| AnalysisError::io(path, e))?;
    Ok(meta.len() as f64 / BYTES_PER_MB)
}

/// Name reported for a decoder format, `"Unknown"` when none was detected.
pub fn format_name(format: Option<ImageFormat>) -> String {
    match format {
        Some(f) => format!("{f:?}").to_uppercase(),
        None => "Unknown".to_string(),
    }
}

/// Open, validate and decode `path`.
///
/// # Errors
///
/// - [`AnalysisError::UnsupportedFormat`] for extensions outside [`SUPPORTED_EXTENSIONS`]
/// - [`AnalysisError::Io`] if the file cannot be opened
/// - [`AnalysisError::FileTooLarge`] above `max_file_size_mb`
/// - [`AnalysisError::ImageLoad`] if decoding fails
pub fn load_image(path: &Path, max_file_size_mb: f64) -> Result<LoadedImage> {
    if !is_image_file(path) {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Err(AnalysisError::UnsupportedFormat { extension });
    }

    let size_bytes = std::fs::metadata(path)
        .map_err(|e| AnalysisError::io(path, e))?
        .len();
    check_size(size_bytes, max_file_size_mb)?;

    let reader = ImageReader::open(path)
        .map_err(|e| AnalysisError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| AnalysisError::io(path, e))?;
    let format = reader.format();

    let img: DynamicImage = reader.decode().map_err(|e| {
        AnalysisError::image_load(format!("Failed to decode image: {}", path.display()), e)
    })?;

    let image = img.to_rgb8();
    debug!(path = %path.display(), width = image.width(), height = image.height(), "decoded image");

    Ok(LoadedImage {
        metadata: ImageMetadata {
            file_path: path.to_string_lossy().into_owned(),
            width: image.width(),
            height: image.height(),
            format: format_name(format),
            size_bytes,
        },
        image,
    })
}

/// Decode an in-memory file. `name` is recorded as the file path.
pub fn load_from_memory(bytes: &[u8], name: &str, max_file_size_mb: f64) -> Result<LoadedImage> {
    check_size(bytes.len() as u64, max_file_size_mb)?;

    let format = image::guess_format(bytes).ok();
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AnalysisError::io(name, e))?;
    let img = reader
        .decode()
        .map_err(|e| AnalysisError::image_load(format!("Failed to decode image: {name}"), e))?;

    let image = img.to_rgb8();
    Ok(LoadedImage {
        metadata: ImageMetadata {
            file_path: name.to_string(),
            width: image.width(),
            height: image.height(),
            format: format_name(format),
            size_bytes: bytes.len() as u64,
        },
        image,
    })
}

fn check_size(size_bytes: u64, max_file_size_mb: f64) -> Result<()> {
    let size_mb = size_bytes as f64 / BYTES_PER_MB;
    if size_mb > max_file_size_mb {
        return Err(AnalysisError::FileTooLarge {
            size_mb,
            limit_mb: max_file_size_mb,
        });
    }
    Ok(())
}

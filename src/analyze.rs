//! File-level analysis: decode, extract, time, and assemble an [`ImageResult`].

use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::extract::{ExtractOptions, extract_colors_with};
use crate::loader::{LoadedImage, load_from_memory, load_image};
use crate::model::ImageResult;
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::info;

/// Analyze an image file with the default configuration.
///
/// # Errors
///
/// Only loading can fail (unsupported extension, unreadable, too large,
/// undecodable). Once decoded, the image always yields a non-empty palette.
pub fn analyze_image(path: &Path) -> Result<ImageResult> {
    analyze_image_with(path, &AnalyzerConfig::default())
}

pub fn analyze_image_with(path: &Path, config: &AnalyzerConfig) -> Result<ImageResult> {
    config.validate()?;
    let started = Utc::now();
    let loaded = load_image(path, config.max_file_size_mb)?;
    Ok(finish(loaded, config, started))
}

/// Analyze an in-memory encoded image; `name` stands in for the file path.
pub fn analyze_bytes(bytes: &[u8], name: &str, config: &AnalyzerConfig) -> Result<ImageResult> {
    config.validate()?;
    let started = Utc::now();
    let loaded = load_from_memory(bytes, name, config.max_file_size_mb)?;
    Ok(finish(loaded, config, started))
}

fn finish(loaded: LoadedImage, config: &AnalyzerConfig, started: DateTime<Utc>) -> ImageResult {
    let LoadedImage { image, metadata } = loaded;
    let colors = extract_colors_with(&image, &ExtractOptions::from(config));
    let elapsed = seconds_since(started);

    info!(
        file = %metadata.file_path,
        width = metadata.width,
        height = metadata.height,
        colors = colors.len(),
        seconds = elapsed,
        "analysis complete"
    );
    ImageResult::new(metadata, colors, elapsed)
}

fn seconds_since(started: DateTime<Utc>) -> f64 {
    let delta = Utc::now() - started;
    delta
        .num_microseconds()
        .map(|us| us as f64 / 1_000_000.0)
        .unwrap_or_else(|| delta.num_milliseconds() as f64 / 1_000.0)
        .max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Grouping;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(img: &RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_analyze_bytes_solid() {
        let bytes = png_bytes(&RgbImage::from_pixel(50, 40, Rgb([0, 128, 255])));
        let result = analyze_bytes(&bytes, "solid.png", &AnalyzerConfig::default()).unwrap();

        assert_eq!(result.width(), 50);
        assert_eq!(result.height(), 40);
        assert_eq!(result.format(), "PNG");
        assert_eq!(result.colors().len(), 1);
        assert_eq!(result.colors()[0].hex_code(), "#0080FF");
        assert!(result.analysis_time_seconds() >= 0.0);
    }

    #[test]
    fn test_analyze_bytes_rejects_invalid_config() {
        let bytes = png_bytes(&RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])));
        let config = AnalyzerConfig::default().with_max_colors(0);
        assert!(analyze_bytes(&bytes, "x.png", &config).is_err());
    }

    #[test]
    fn test_analyze_bytes_garbage() {
        let result = analyze_bytes(b"definitely not an image", "junk.png", &AnalyzerConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_kmeans_grouping_through_config() {
        let img = RgbImage::from_fn(20, 20, |x, _| {
            if x < 10 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
        });
        let config = AnalyzerConfig::default().with_grouping(Grouping::KMeans);
        let result = analyze_bytes(&png_bytes(&img), "halves.png", &config).unwrap();

        assert_eq!(result.colors().len(), 2);
        let total: f64 = result.colors().iter().map(|c| c.percentage()).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_seconds_since_is_non_negative() {
        assert!(seconds_since(Utc::now()) >= 0.0);
    }
}

//! Value types produced by an analysis.
//!
//! [`ColorEntry`] is one ranked, localized color. [`ImageResult`] bundles the
//! entries of one image with the metadata the rendering and history layers
//! need. Both are read-only once built: fields are private and only exposed
//! through accessors, and the hex code is always derived from the RGB triple.

use chrono::{DateTime, Utc};
use palette::{FromColor, Hsl, Hsv, Srgb};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Pixel coordinate in the original (pre-downscale) image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Center pixel of a `width`×`height` image
    pub fn center_of(width: u32, height: u32) -> Self {
        Self {
            x: width / 2,
            y: height / 2,
        }
    }
}

/// `#RRGGBB`, uppercase, two digits per channel.
pub fn hex_code(rgb: Srgb<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb.red, rgb.green, rgb.blue)
}

/// One retained color of an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ColorEntryRecord", try_from = "ColorEntryRecord")]
pub struct ColorEntry {
    rgb: Srgb<u8>,
    percentage: f64,
    pixel_count: u64,
    position: Option<Position>,
}

impl ColorEntry {
    pub fn new(
        rgb: Srgb<u8>,
        percentage: f64,
        pixel_count: u64,
        position: Option<Position>,
    ) -> Self {
        Self {
            rgb,
            percentage: percentage.clamp(0.0, 100.0),
            pixel_count,
            position,
        }
    }

    /// Neutral gray covering the whole image, used when extraction cannot
    /// produce anything better.
    pub fn fallback(position: Option<Position>, pixel_count: u64) -> Self {
        Self::new(Srgb::new(128, 128, 128), 100.0, pixel_count, position)
    }

    pub fn rgb(&self) -> Srgb<u8> {
        self.rgb
    }

    pub fn rgb_tuple(&self) -> (u8, u8, u8) {
        (self.rgb.red, self.rgb.green, self.rgb.blue)
    }

    pub fn hex_code(&self) -> String {
        hex_code(self.rgb)
    }

    /// Share of sampled pixels, in `[0, 100]`
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    /// Matching pixels in the (downscaled) sample
    pub fn pixel_count(&self) -> u64 {
        self.pixel_count
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// (hue in degrees `[0, 360)`, saturation %, lightness %)
    pub fn hsl(&self) -> (f32, f32, f32) {
        let hsl: Hsl = Hsl::from_color(self.rgb.into_format::<f32>());
        (
            normalize_hue(hsl.hue.into_positive_degrees()),
            hsl.saturation * 100.0,
            hsl.lightness * 100.0,
        )
    }

    /// (hue in degrees `[0, 360)`, saturation %, value %)
    pub fn hsv(&self) -> (f32, f32, f32) {
        let hsv: Hsv = Hsv::from_color(self.rgb.into_format::<f32>());
        (
            normalize_hue(hsv.hue.into_positive_degrees()),
            hsv.saturation * 100.0,
            hsv.value * 100.0,
        )
    }
}

impl fmt::Display for ColorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1}%)", self.hex_code(), self.percentage)
    }
}

// 359.99998 rounds up to 360.0 in f32 for some near-red inputs
fn normalize_hue(degrees: f32) -> f32 {
    if degrees >= 360.0 { 0.0 } else { degrees }
}

/// Serialized shape of a [`ColorEntry`]. The hex code is written for
/// consumers that only read JSON and is checked against `rgb` on the way in.
#[derive(Serialize, Deserialize)]
struct ColorEntryRecord {
    rgb: [u8; 3],
    #[serde(default)]
    hex_code: Option<String>,
    percentage: f64,
    #[serde(default)]
    pixel_count: u64,
    #[serde(default)]
    position: Option<Position>,
}

impl From<ColorEntry> for ColorEntryRecord {
    fn from(entry: ColorEntry) -> Self {
        Self {
            rgb: [entry.rgb.red, entry.rgb.green, entry.rgb.blue],
            hex_code: Some(entry.hex_code()),
            percentage: entry.percentage,
            pixel_count: entry.pixel_count,
            position: entry.position,
        }
    }
}

impl TryFrom<ColorEntryRecord> for ColorEntry {
    type Error = String;

    fn try_from(record: ColorEntryRecord) -> Result<Self, Self::Error> {
        let [r, g, b] = record.rgb;
        let rgb = Srgb::new(r, g, b);
        if let Some(stored) = &record.hex_code {
            let derived = hex_code(rgb);
            if !stored.eq_ignore_ascii_case(&derived) {
                return Err(format!(
                    "hex_code {stored} does not match rgb ({r}, {g}, {b}), expected {derived}"
                ));
            }
        }
        if !(0.0..=100.0).contains(&record.percentage) {
            return Err(format!("percentage {} out of range", record.percentage));
        }
        Ok(Self {
            rgb,
            percentage: record.percentage,
            pixel_count: record.pixel_count,
            position: record.position,
        })
    }
}

/// Facts about the source file captured when it was decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub file_path: String,
    /// Original width in pixels
    pub width: u32,
    /// Original height in pixels
    pub height: u32,
    /// Decoder-reported format name, `"Unknown"` when it could not be guessed
    pub format: String,
    pub size_bytes: u64,
}

/// One completed analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    #[serde(flatten)]
    metadata: ImageMetadata,
    colors: Vec<ColorEntry>,
    analysis_time_seconds: f64,
    timestamp: DateTime<Utc>,
}

impl ImageResult {
    /// Build a result stamped with the current time.
    pub fn new(
        metadata: ImageMetadata,
        colors: Vec<ColorEntry>,
        analysis_time_seconds: f64,
    ) -> Self {
        Self::with_timestamp(metadata, colors, analysis_time_seconds, Utc::now())
    }

    /// Build a result with a known creation time, e.g. one restored from history.
    pub fn with_timestamp(
        metadata: ImageMetadata,
        colors: Vec<ColorEntry>,
        analysis_time_seconds: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            metadata,
            colors,
            analysis_time_seconds: analysis_time_seconds.max(0.0),
            timestamp,
        }
    }

    pub fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }

    pub fn file_path(&self) -> &str {
        &self.metadata.file_path
    }

    pub fn width(&self) -> u32 {
        self.metadata.width
    }

    pub fn height(&self) -> u32 {
        self.metadata.height
    }

    pub fn format(&self) -> &str {
        &self.metadata.format
    }

    pub fn size_bytes(&self) -> u64 {
        self.metadata.size_bytes
    }

    /// Entries ordered by descending percentage
    pub fn colors(&self) -> &[ColorEntry] {
        &self.colors
    }

    pub fn analysis_time_seconds(&self) -> f64 {
        self.analysis_time_seconds
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Status-bar line, e.g. `Extracted 12 colors in 0.34s`
    pub fn summary(&self) -> String {
        format!(
            "Extracted {} colors in {:.2}s",
            self.colors.len(),
            self.analysis_time_seconds
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl fmt::Display for ImageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = Path::new(&self.metadata.file_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.metadata.file_path.clone());
        write!(
            f,
            "{} | {}×{} | {:.1}MB",
            name,
            self.metadata.width,
            self.metadata.height,
            self.metadata.size_bytes as f64 / (1024.0 * 1024.0)
        )
    }
}

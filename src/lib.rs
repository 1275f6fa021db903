//! # piccolor
//!
//! Dominant-color extraction for image viewers: load a picture, get back its
//! most prevalent colors, each with a share of the image, a copyable value and
//! a pixel position where the color can be found.
//!
//! ```rust,no_run
//! use piccolor::{analyze_image, ColorFormat};
//! use std::path::Path;
//!
//! let result = analyze_image(Path::new("photo.jpg"))?;
//! for color in result.colors() {
//!     println!("{} {:.1}% at {:?}", ColorFormat::Hsl.render(color), color.percentage(), color.position());
//! }
//! # Ok::<(), piccolor::AnalysisError>(())
//! ```

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

pub mod analyze;
pub mod cluster;
pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod loader;
pub mod model;
#[cfg(not(target_arch = "wasm32"))]
pub mod worker;

pub use analyze::{analyze_bytes, analyze_image, analyze_image_with};
pub use config::{AnalyzerConfig, Grouping};
pub use error::{AnalysisError, Result};
pub use extract::{ExtractOptions, extract_colors, extract_colors_from_raw, extract_colors_with};
pub use format::{ColorFormat, format_all};
pub use model::{ColorEntry, ImageMetadata, ImageResult, Position};
#[cfg(not(target_arch = "wasm32"))]
pub use worker::{AnalysisEvent, AnalysisWorker};

/// Extract the palette of an encoded image held in memory.
///
/// Returns `{ width, height, format, sizeBytes, analysisTime, colors }` where
/// every color is `{ hex, rgb: [r, g, b], percentage, x, y }` (`x`/`y` are
/// `null` when no position is known).
#[wasm_bindgen]
pub fn extract_palette(
    input: Vec<u8>,
    max_colors: usize,
    min_pixel_threshold: u32,
) -> std::result::Result<Object, JsValue> {
    let config = AnalyzerConfig::default()
        .with_max_colors(max_colors)
        .with_min_pixel_threshold(min_pixel_threshold);
    let result = analyze_bytes(&input, "upload", &config)
        .map_err(|e| JsValue::from_str(&format!("Unable to analyze image: {e}")))?;

    let colors_js = Array::new();
    for color in result.colors() {
        let (r, g, b) = color.rgb_tuple();
        let rgb_js = Array::of3(&r.into(), &g.into(), &b.into());
        let (x, y) = match color.position() {
            Some(p) => (JsValue::from(p.x), JsValue::from(p.y)),
            None => (JsValue::NULL, JsValue::NULL),
        };

        let entry = Object::new();
        Reflect::set(&entry, &"hex".into(), &color.hex_code().into())?;
        Reflect::set(&entry, &"rgb".into(), &rgb_js)?;
        Reflect::set(&entry, &"percentage".into(), &color.percentage().into())?;
        Reflect::set(&entry, &"x".into(), &x)?;
        Reflect::set(&entry, &"y".into(), &y)?;
        colors_js.push(&entry);
    }

    let out = Object::new();
    Reflect::set(&out, &"width".into(), &result.width().into())?;
    Reflect::set(&out, &"height".into(), &result.height().into())?;
    Reflect::set(&out, &"format".into(), &result.format().into())?;
    Reflect::set(&out, &"sizeBytes".into(), &(result.size_bytes() as f64).into())?;
    Reflect::set(&out, &"analysisTime".into(), &result.analysis_time_seconds().into())?;
    Reflect::set(&out, &"colors".into(), &colors_js)?;

    Ok(out)
}

//! Dominant color extraction.
//!
//! Steps performed:
//! 1. Down-scale (Lanczos3, aspect preserved) so the longest side is at most
//!    `max_dimension`, remembering the factor `s = max_dimension / longest side`.
//! 2. Group the sampled pixels, either by exact RGB triple or by k-means
//!    (see [`crate::cluster`]), and rank the groups by pixel count.
//! 3. Drop groups below `min_pixel_threshold`, relaxing the bar once to a
//!    tenth of itself when fewer than three survive. If that still leaves
//!    fewer than three, the next most frequent groups fill the gap.
//! 4. Keep the top `max_colors` and express each count as a share of the sample.
//! 5. Locate every kept color at the centroid of the sample pixels within
//!    `similarity_threshold` of it, mapped back to original coordinates.
//!
//! The public functions never fail: any internal error is logged and replaced
//! by a single neutral-gray entry so the caller always has a palette to show.

use crate::cluster::cluster_colors;
use crate::config::{
    AnalyzerConfig, DEFAULT_MAX_COLORS, DEFAULT_MAX_DIMENSION, DEFAULT_MIN_PIXEL_THRESHOLD,
    DEFAULT_SIMILARITY_THRESHOLD, Grouping,
};
use crate::error::{AnalysisError, Result};
use crate::model::{ColorEntry, Position};
use image::{RgbImage, imageops::FilterType};
use indexmap::IndexMap;
use palette::Srgb;
use std::borrow::Cow;
use tracing::{debug, warn};

/// Below this many surviving colors the pixel threshold is relaxed once.
const MIN_RETAINED_COLORS: usize = 3;
const RELAXATION_DIVISOR: u32 = 10;

/// Parameters of a single extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractOptions {
    pub max_colors: usize,
    pub min_pixel_threshold: u32,
    pub max_dimension: u32,
    pub similarity_threshold: f32,
    pub grouping: Grouping,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_colors: DEFAULT_MAX_COLORS,
            min_pixel_threshold: DEFAULT_MIN_PIXEL_THRESHOLD,
            max_dimension: DEFAULT_MAX_DIMENSION,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            grouping: Grouping::Exact,
        }
    }
}

impl From<&AnalyzerConfig> for ExtractOptions {
    fn from(config: &AnalyzerConfig) -> Self {
        Self {
            max_colors: config.max_colors,
            min_pixel_threshold: config.min_pixel_threshold,
            max_dimension: config.max_dimension,
            similarity_threshold: config.similarity_threshold,
            grouping: config.grouping,
        }
    }
}

/// Extract up to `max_colors` dominant colors with the default sampling
/// parameters and exact-match grouping.
pub fn extract_colors(
    image: &RgbImage,
    max_colors: usize,
    min_pixel_threshold: u32,
) -> Vec<ColorEntry> {
    let options = ExtractOptions {
        max_colors,
        min_pixel_threshold,
        ..ExtractOptions::default()
    };
    extract_colors_with(image, &options)
}

/// Extract dominant colors with explicit options.
///
/// Entries come back sorted by descending percentage; equal counts keep the
/// order in which the colors were first met scanning the sample row by row.
pub fn extract_colors_with(image: &RgbImage, options: &ExtractOptions) -> Vec<ColorEntry> {
    let (width, height) = image.dimensions();
    match try_extract(image, options) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, width, height, "color extraction failed, using fallback entry");
            vec![fallback_entry(width, height)]
        }
    }
}

/// Extract from a raw interleaved RGB8 buffer.
///
/// A buffer whose length does not match `width * height * 3` yields the
/// fallback entry instead of an error.
pub fn extract_colors_from_raw(
    width: u32,
    height: u32,
    data: &[u8],
    options: &ExtractOptions,
) -> Vec<ColorEntry> {
    let expected = width as usize * height as usize * 3;
    if data.len() != expected {
        warn!(
            width,
            height,
            len = data.len(),
            expected,
            "pixel buffer size mismatch, using fallback entry"
        );
        return vec![fallback_entry(width, height)];
    }
    match RgbImage::from_raw(width, height, data.to_vec()) {
        Some(image) => extract_colors_with(&image, options),
        None => vec![fallback_entry(width, height)],
    }
}

fn fallback_entry(width: u32, height: u32) -> ColorEntry {
    let position = (width > 0 && height > 0).then(|| Position::center_of(width, height));
    ColorEntry::fallback(position, width as u64 * height as u64)
}

fn try_extract(image: &RgbImage, options: &ExtractOptions) -> Result<Vec<ColorEntry>> {
    let (orig_w, orig_h) = image.dimensions();
    if orig_w == 0 || orig_h == 0 {
        return Err(AnalysisError::invalid_buffer(format!(
            "image has no pixels ({orig_w}x{orig_h})"
        )));
    }
    if options.max_dimension == 0 {
        return Err(AnalysisError::invalid_config("max_dimension", 0));
    }
    let max_colors = if options.max_colors == 0 {
        warn!("max_colors is 0, returning a single color");
        1
    } else {
        options.max_colors
    };

    let (sample, scale) = downscale(image, options.max_dimension);
    let total = sample.width() as u64 * sample.height() as u64;

    let ranked = match options.grouping {
        Grouping::Exact => rank_exact(&sample),
        Grouping::KMeans => cluster_colors(&sample, max_colors),
    };
    debug!(
        distinct = ranked.len(),
        sampled_pixels = total,
        grouping = %options.grouping,
        "built color histogram"
    );

    let mut kept = retain_frequent(&ranked, options.min_pixel_threshold);
    kept.truncate(max_colors);

    let locator = Locator {
        sample: &sample,
        scale,
        orig_w,
        orig_h,
        threshold: options.similarity_threshold,
    };

    Ok(kept
        .into_iter()
        .map(|(rgb, count)| {
            let percentage = count as f64 * 100.0 / total as f64;
            ColorEntry::new(rgb, percentage, count, Some(locator.locate(rgb)))
        })
        .collect())
}

/// Resample so the longer side is at most `max_dimension`.
///
/// Returns the sample and the factor that maps original coordinates onto it.
fn downscale(image: &RgbImage, max_dimension: u32) -> (Cow<'_, RgbImage>, f64) {
    let (orig_w, orig_h) = image.dimensions();
    let max_side = orig_w.max(orig_h);
    if max_side <= max_dimension {
        return (Cow::Borrowed(image), 1.0);
    }

    let ratio = max_dimension as f64 / max_side as f64;
    // longer side lands on max_dimension exactly, the shorter one is truncated
    let side = |len: u32| (len as u64 * max_dimension as u64 / max_side as u64).max(1) as u32;
    let (w, h) = (side(orig_w), side(orig_h));
    debug!(orig_w, orig_h, w, h, scale = ratio, "downscaled for analysis");

    (
        Cow::Owned(image::imageops::resize(image, w, h, FilterType::Lanczos3)),
        ratio,
    )
}

/// Count every distinct triple, most frequent first.
fn rank_exact(sample: &RgbImage) -> Vec<(Srgb<u8>, u64)> {
    let mut counts: IndexMap<[u8; 3], u64> = IndexMap::new();
    for pixel in sample.pixels() {
        *counts.entry(pixel.0).or_insert(0) += 1;
    }

    let mut ranked: Vec<(Srgb<u8>, u64)> = counts
        .into_iter()
        .map(|([r, g, b], count)| (Srgb::new(r, g, b), count))
        .collect();
    // stable: ties stay in first-seen order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Keep entries of `ranked` (sorted by count, descending) that clear `threshold`.
fn retain_frequent(ranked: &[(Srgb<u8>, u64)], threshold: u32) -> Vec<(Srgb<u8>, u64)> {
    let above = |t: u32| -> Vec<(Srgb<u8>, u64)> {
        ranked
            .iter()
            .take_while(|(_, count)| *count >= t as u64)
            .copied()
            .collect()
    };

    let kept = above(threshold);
    if kept.len() >= MIN_RETAINED_COLORS {
        return kept;
    }

    let relaxed = (threshold / RELAXATION_DIVISOR).max(1);
    debug!(
        threshold,
        relaxed,
        survivors = kept.len(),
        "too few colors above threshold, relaxing"
    );
    let kept = above(relaxed);
    let floor = MIN_RETAINED_COLORS.min(ranked.len());
    if kept.len() < floor {
        // top up with the next most frequent colors, however rare
        return ranked[..floor].to_vec();
    }
    kept
}

/// Finds a representative original-image position for a color.
struct Locator<'a> {
    sample: &'a RgbImage,
    scale: f64,
    orig_w: u32,
    orig_h: u32,
    threshold: f32,
}

impl Locator<'_> {
    fn locate(&self, color: Srgb<u8>) -> Position {
        match self.centroid(color) {
            Some((cx, cy)) if cx.is_finite() && cy.is_finite() => {
                let x = (cx / self.scale).round().clamp(0.0, (self.orig_w - 1) as f64);
                let y = (cy / self.scale).round().clamp(0.0, (self.orig_h - 1) as f64);
                Position::new(x as u32, y as u32)
            }
            Some(_) => {
                warn!(color = ?color, "non-finite centroid, using central region");
                central_region_point(color, self.orig_w, self.orig_h)
            }
            None => {
                warn!(color = ?color, "no pixel matched color mask, using image center");
                Position::center_of(self.orig_w, self.orig_h)
            }
        }
    }

    /// Mean sample coordinate of pixels strictly closer than the threshold.
    fn centroid(&self, color: Srgb<u8>) -> Option<(f64, f64)> {
        let limit = self.threshold * self.threshold;
        let target = [color.red as i32, color.green as i32, color.blue as i32];

        let mut sum_x = 0u64;
        let mut sum_y = 0u64;
        let mut matched = 0u64;
        for (x, y, pixel) in self.sample.enumerate_pixels() {
            let dr = pixel[0] as i32 - target[0];
            let dg = pixel[1] as i32 - target[1];
            let db = pixel[2] as i32 - target[2];
            if ((dr * dr + dg * dg + db * db) as f32) < limit {
                sum_x += x as u64;
                sum_y += y as u64;
                matched += 1;
            }
        }

        (matched > 0).then(|| (sum_x as f64 / matched as f64, sum_y as f64 / matched as f64))
    }
}

/// Deterministic point inside the central half of the image, keyed on the color.
fn central_region_point(color: Srgb<u8>, width: u32, height: u32) -> Position {
    let key = color.red as u32 * 65_536 + color.green as u32 * 256 + color.blue as u32;
    let span_w = (width / 2).max(1);
    let span_h = (height / 2).max(1);
    Position::new(
        (width / 4 + key % span_w).min(width.saturating_sub(1)),
        (height / 4 + (key / 7) % span_h).min(height.saturating_sub(1)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb(rgb))
    }

    #[test]
    fn test_downscale_noop_for_small_images() {
        let img = solid(800, 200, [1, 2, 3]);
        let (sample, scale) = downscale(&img, 800);
        assert!(matches!(sample, Cow::Borrowed(_)));
        assert_eq!(scale, 1.0);
    }

    #[test]
    fn test_downscale_longest_side_is_max_dimension() {
        let img = solid(1600, 900, [1, 2, 3]);
        let (sample, scale) = downscale(&img, 800);
        assert_eq!(sample.dimensions(), (800, 450));
        assert!((scale - 0.5).abs() < 1e-12);

        let img = solid(300, 2400, [1, 2, 3]);
        let (sample, scale) = downscale(&img, 800);
        assert_eq!(sample.dimensions(), (100, 800));
        assert!((scale - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rank_exact_orders_by_count_then_first_seen() {
        // row-major: B, A, A, C, B, A  -> A:3, B:2, C:1
        let mut img = RgbImage::new(3, 2);
        let a = Rgb([10, 10, 10]);
        let b = Rgb([20, 20, 20]);
        let c = Rgb([30, 30, 30]);
        for (i, px) in [b, a, a, c, b, a].into_iter().enumerate() {
            img.put_pixel(i as u32 % 3, i as u32 / 3, px);
        }

        let ranked = rank_exact(&img);
        let counts: Vec<u64> = ranked.iter().map(|(_, n)| *n).collect();
        assert_eq!(counts, vec![3, 2, 1]);
        assert_eq!(ranked[0].0, Srgb::new(10, 10, 10));
    }

    #[test]
    fn test_rank_exact_tie_keeps_scan_order() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([200, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 200, 0]));
        let ranked = rank_exact(&img);
        assert_eq!(ranked[0].0, Srgb::new(200, 0, 0));
        assert_eq!(ranked[1].0, Srgb::new(0, 200, 0));
    }

    #[test]
    fn test_retain_frequent_relaxes_once() {
        let ranked = vec![
            (Srgb::new(1, 1, 1), 150),
            (Srgb::new(2, 2, 2), 40),
            (Srgb::new(3, 3, 3), 12),
            (Srgb::new(4, 4, 4), 5),
        ];
        let kept = retain_frequent(&ranked, 100);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[2].1, 12);
    }

    #[test]
    fn test_retain_frequent_no_relaxation_when_enough() {
        let ranked = vec![
            (Srgb::new(1, 1, 1), 300),
            (Srgb::new(2, 2, 2), 200),
            (Srgb::new(3, 3, 3), 100),
            (Srgb::new(4, 4, 4), 99),
        ];
        assert_eq!(retain_frequent(&ranked, 100).len(), 3);
    }

    #[test]
    fn test_downscale_truncates_shorter_side() {
        let img = solid(1000, 501, [1, 2, 3]);
        let (sample, _) = downscale(&img, 800);
        assert_eq!(sample.dimensions(), (800, 400));
    }

    #[test]
    fn test_retain_frequent_tops_up_to_three() {
        let ranked = vec![
            (Srgb::new(1, 1, 1), 20),
            (Srgb::new(2, 2, 2), 5),
            (Srgb::new(3, 3, 3), 5),
            (Srgb::new(4, 4, 4), 4),
        ];
        let kept = retain_frequent(&ranked, 100);
        assert_eq!(kept, ranked[..3].to_vec());
    }

    #[test]
    fn test_retain_frequent_top_up_bounded_by_distinct_colors() {
        let ranked = vec![(Srgb::new(1, 1, 1), 20), (Srgb::new(2, 2, 2), 5)];
        assert_eq!(retain_frequent(&ranked, 100), ranked);
    }

    #[test]
    fn test_retain_frequent_keeps_everything_when_nothing_survives() {
        let ranked = vec![(Srgb::new(9, 9, 9), 1)];
        assert_eq!(retain_frequent(&ranked, 100), ranked);
    }

    #[test]
    fn test_centroid_of_block() {
        let mut img = solid(10, 10, [255, 255, 255]);
        for y in 2..4 {
            for x in 6..8 {
                img.put_pixel(x, y, Rgb([0, 0, 200]));
            }
        }
        let locator = Locator {
            sample: &img,
            scale: 1.0,
            orig_w: 10,
            orig_h: 10,
            threshold: 30.0,
        };
        let (cx, cy) = locator.centroid(Srgb::new(0, 0, 200)).unwrap();
        assert!((cx - 6.5).abs() < 1e-9);
        assert!((cy - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_is_strict() {
        let img = solid(4, 4, [30, 0, 0]);
        let locator = Locator {
            sample: &img,
            scale: 1.0,
            orig_w: 4,
            orig_h: 4,
            threshold: 30.0,
        };
        // distance exactly 30: not a match, so the locator falls back to the center
        assert!(locator.centroid(Srgb::new(0, 0, 0)).is_none());
        assert_eq!(locator.locate(Srgb::new(0, 0, 0)), Position::new(2, 2));
    }

    #[test]
    fn test_locate_maps_back_and_clamps() {
        let img = solid(4, 2, [5, 5, 5]);
        let locator = Locator {
            sample: &img,
            scale: 0.5,
            orig_w: 7,
            orig_h: 4,
            threshold: 30.0,
        };
        // centroid (1.5, 0.5) / 0.5 = (3, 1)
        assert_eq!(locator.locate(Srgb::new(5, 5, 5)), Position::new(3, 1));
    }

    #[test]
    fn test_central_region_point_in_bounds() {
        for (w, h) in [(1, 1), (2, 3), (100, 40), (4000, 3000)] {
            for rgb in [Srgb::new(0, 0, 0), Srgb::new(255, 255, 255), Srgb::new(12, 99, 3)] {
                let p = central_region_point(rgb, w, h);
                assert!(p.x < w && p.y < h, "{p:?} outside {w}x{h}");
                if w >= 4 {
                    assert!(p.x >= w / 4 && p.x < w / 4 + w / 2);
                }
            }
        }
    }

    #[test]
    fn test_empty_image_falls_back() {
        let img = RgbImage::new(0, 0);
        let entries = extract_colors(&img, 16, 100);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].hex_code(), "#808080");
        assert_eq!(entries[0].percentage(), 100.0);
        assert_eq!(entries[0].position(), None);
    }

    #[test]
    fn test_raw_buffer_size_mismatch_falls_back() {
        let entries = extract_colors_from_raw(10, 10, &[0u8; 17], &ExtractOptions::default());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rgb_tuple(), (128, 128, 128));
        assert_eq!(entries[0].position(), Some(Position::new(5, 5)));
    }

    #[test]
    fn test_raw_buffer_matches_image_path() {
        let img = solid(20, 20, [9, 8, 7]);
        let from_raw = extract_colors_from_raw(20, 20, img.as_raw(), &ExtractOptions::default());
        assert_eq!(from_raw, extract_colors(&img, 16, 100));
    }

    #[test]
    fn test_zero_max_colors_returns_one() {
        let img = solid(5, 5, [1, 1, 1]);
        assert_eq!(extract_colors(&img, 0, 100).len(), 1);
    }
}

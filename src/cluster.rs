//! K-means grouping of near-identical colors.
//!
//! Photographs with soft gradients produce hundreds of exact triples that
//! differ by a unit or two. This grouping runs k-means in CIE Lab over the
//! sampled pixels and reports each cluster's centroid with its member count,
//! so the palette lists perceptually distinct colors instead.

use image::RgbImage;
use indexmap::IndexSet;
use kmeans_colors::get_kmeans;
use palette::{IntoColor, Lab, Srgb};
use tracing::warn;

const MAX_ITERATIONS: usize = 20;
const CONVERGENCE: f32 = 1e-4;
const SEED: u64 = 0;
/// `Kmeans::indices` stores cluster ids as `u8`.
pub const MAX_CLUSTERS: usize = u8::MAX as usize + 1;

/// Cluster `sample` into at most `max_colors` groups (never more than
/// [`MAX_CLUSTERS`]), most populous first.
///
/// Ties keep the cluster order produced by k-means, which is fixed for a given
/// input because the seed is.
pub fn cluster_colors(sample: &RgbImage, max_colors: usize) -> Vec<(Srgb<u8>, u64)> {
    let distinct: IndexSet<[u8; 3]> = sample.pixels().map(|p| p.0).collect();
    if distinct.is_empty() {
        return Vec::new();
    }

    let total = sample.width() as u64 * sample.height() as u64;
    if max_colors > MAX_CLUSTERS {
        warn!(max_colors, limit = MAX_CLUSTERS, "k-means cluster count capped");
    }
    let k = max_colors.min(MAX_CLUSTERS).min(distinct.len()).max(1);
    if k == 1 && distinct.len() == 1 {
        let [r, g, b] = distinct[0];
        return vec![(Srgb::new(r, g, b), total)];
    }

    let lab_pixels: Vec<Lab> = sample
        .pixels()
        .map(|p| {
            let srgb = Srgb::<u8>::new(p[0], p[1], p[2]);
            srgb.into_linear().into_color()
        })
        .collect();

    let kmeans = get_kmeans(k, MAX_ITERATIONS, CONVERGENCE, false, &lab_pixels, SEED);

    let mut counts = vec![0u64; kmeans.centroids.len()];
    for &idx in &kmeans.indices {
        counts[idx as usize] += 1;
    }

    let mut ranked: Vec<(Srgb<u8>, u64)> = kmeans
        .centroids
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(&lab, count)| {
            let rgb_f32: Srgb<f32> = Srgb::from_linear(lab.into_color());
            (rgb_f32.into_format::<u8>(), count)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

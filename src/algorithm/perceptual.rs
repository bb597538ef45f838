//! Histogram-then-cluster extraction in OKLab.
//!
//! Pixels are first collapsed into a spatially weighted histogram keyed on a
//! coarse OKLab grid, so the clustering below runs over a few hundred entries
//! instead of every pixel.

use std::collections::HashMap;

use palette::Oklab;
use tracing::debug;

use crate::buffer::{PixelBuffer, center_weight, opaque_pixels};
use crate::color::{Color, from_f32_channels, to_oklab};
use crate::distance::{DistanceMode, oklab_distance, oklab_distance_sq};
use crate::error::{PaletteError, Result};
use crate::pipeline::keep_distinct;
use crate::validity::is_valid;

use super::kmeans::pick_weighted;
use super::{AlgorithmId, ExtractContext};

const MAX_SIDE: u32 = 500;
const SPATIAL_FALLOFF: f32 = 0.3;
/// Histogram cells per OKLab unit; lightness is bucketed more coarsely.
const L_STEPS: f32 = 20.0;
const AB_STEPS: f32 = 40.0;
const K: usize = 8;
const MAX_ITERATIONS: usize = 25;
const CONVERGENCE: f32 = 0.001;
/// CIEDE2000 distance below which two cluster colors are merged.
const DEDUP_THRESHOLD: f32 = 8.0;

#[derive(Clone, Copy, Debug)]
struct Bin {
    weight: f32,
    rgb_sum: [f32; 3],
    /// OKLab of the first pixel that landed here.
    oklab: Oklab,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    oklab: Oklab,
    rgb: [f32; 3],
    weight: f32,
}

#[derive(Clone, Copy, Debug)]
struct Cluster {
    center: Oklab,
    rgb: [f32; 3],
    weight: f32,
}

pub(super) fn extract(buffer: &PixelBuffer, ctx: &mut ExtractContext) -> Result<Vec<Color>> {
    let entries = histogram(buffer);
    if entries.is_empty() {
        return Err(PaletteError::failure(AlgorithmId::Perceptual, "no opaque pixels"));
    }

    let mut clusters = seed(&entries, ctx);
    for iteration in 0..MAX_ITERATIONS {
        ctx.checkpoint(AlgorithmId::Perceptual)?;
        if step(&entries, &mut clusters) {
            debug!(iteration, clusters = clusters.len(), "perceptual clustering converged");
            break;
        }
    }

    clusters.retain(|c| c.weight > 0.0);
    clusters.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    let colors: Vec<Color> = clusters
        .iter()
        .map(|c| from_f32_channels(c.rgb[0], c.rgb[1], c.rgb[2]))
        .filter(|c| is_valid(*c))
        .collect();
    Ok(keep_distinct(&colors, DEDUP_THRESHOLD, DistanceMode::Ciede2000))
}

/// Histogram entries, heaviest first.
fn histogram(buffer: &PixelBuffer) -> Vec<Entry> {
    let image = buffer.downscaled(MAX_SIDE);
    let (w, h) = image.dimensions();
    let mut bins: HashMap<[i32; 3], Bin> = HashMap::new();

    for (x, y, color) in opaque_pixels(&image) {
        let weight = center_weight(x, y, w, h, SPATIAL_FALLOFF);
        let oklab = to_oklab(color);
        let key = [
            (oklab.l * L_STEPS).round() as i32,
            (oklab.a * AB_STEPS).round() as i32,
            (oklab.b * AB_STEPS).round() as i32,
        ];
        let bin = bins.entry(key).or_insert(Bin {
            weight: 0.0,
            rgb_sum: [0.0; 3],
            oklab,
        });
        bin.weight += weight;
        bin.rgb_sum[0] += f32::from(color.red) * weight;
        bin.rgb_sum[1] += f32::from(color.green) * weight;
        bin.rgb_sum[2] += f32::from(color.blue) * weight;
    }

    let mut bins: Vec<([i32; 3], Bin)> = bins.into_iter().collect();
    // key breaks weight ties so seeded runs do not depend on hash order
    bins.sort_by(|(ka, a), (kb, b)| b.weight.total_cmp(&a.weight).then_with(|| ka.cmp(kb)));
    bins.into_iter()
        .map(|(_, bin)| Entry {
            oklab: bin.oklab,
            rgb: [
                (bin.rgb_sum[0] / bin.weight).round(),
                (bin.rgb_sum[1] / bin.weight).round(),
                (bin.rgb_sum[2] / bin.weight).round(),
            ],
            weight: bin.weight,
        })
        .collect()
}

/// Heaviest entry first, then k-means++ over `frequency × d²`.
fn seed(entries: &[Entry], ctx: &mut ExtractContext) -> Vec<Cluster> {
    let cluster = |e: &Entry| Cluster {
        center: e.oklab,
        rgb: e.rgb,
        weight: 0.0,
    };
    let mut clusters = vec![cluster(&entries[0])];
    while clusters.len() < K.min(entries.len()) {
        let scores = || {
            entries.iter().map(|e| {
                let d = clusters
                    .iter()
                    .map(|c| oklab_distance(e.oklab, c.center))
                    .fold(f32::INFINITY, f32::min);
                d * d * e.weight
            })
        };
        let total: f32 = scores().sum();
        if total <= 0.0 {
            break;
        }
        let index = pick_weighted(scores(), total, ctx.rng());
        clusters.push(cluster(&entries[index]));
    }
    clusters
}

/// One assignment/update round. Returns true once no center moved more than
/// the convergence threshold.
fn step(entries: &[Entry], clusters: &mut [Cluster]) -> bool {
    // l, a, b, r, g, b, weight
    let mut sums = vec![[0.0f32; 7]; clusters.len()];
    for entry in entries {
        let nearest = clusters
            .iter()
            .enumerate()
            .map(|(i, c)| (i, oklab_distance_sq(entry.oklab, c.center)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(0, |(i, _)| i);
        let s = &mut sums[nearest];
        let w = entry.weight;
        s[0] += entry.oklab.l * w;
        s[1] += entry.oklab.a * w;
        s[2] += entry.oklab.b * w;
        s[3] += entry.rgb[0] * w;
        s[4] += entry.rgb[1] * w;
        s[5] += entry.rgb[2] * w;
        s[6] += w;
    }

    let mut converged = true;
    for (cluster, s) in clusters.iter_mut().zip(&sums) {
        let w = s[6];
        if w <= 0.0 {
            continue;
        }
        let center = Oklab::new(s[0] / w, s[1] / w, s[2] / w);
        if oklab_distance(cluster.center, center) > CONVERGENCE {
            converged = false;
        }
        cluster.center = center;
        cluster.rgb = [(s[3] / w).round(), (s[4] / w).round(), (s[5] / w).round()];
        cluster.weight = w;
    }
    converged
}

use std::collections::HashSet;

use kmeans_colors::{Sort, get_kmeans_hamerly};
use palette::{FromColor, Lab, Srgb};
use rand::Rng;
use tracing::debug;

use crate::buffer::{PixelBuffer, opaque_pixels};
use crate::color::{Color, to_lab};
use crate::error::{PaletteError, Result};
use crate::validity::is_valid;

use super::{AlgorithmId, ExtractContext};

const MAX_SIDE: u32 = 256;
const MAX_SWATCHES: usize = 24;
const MAX_ITERATIONS: usize = 20;
const CONVERGENCE: f32 = 1e-4;

/// Population-ranked swatches: cluster the Lab pixels into up to 24 groups,
/// order the groups by how many pixels they cover, keep the ones that are not
/// noise.
pub(super) fn extract(buffer: &PixelBuffer, ctx: &mut ExtractContext) -> Result<Vec<Color>> {
    let image = buffer.downscaled(MAX_SIDE);
    let mut distinct = HashSet::new();
    let lab: Vec<Lab> = opaque_pixels(&image)
        .inspect(|(_, _, c)| {
            distinct.insert([c.red, c.green, c.blue]);
        })
        .map(|(_, _, c)| to_lab(c))
        .collect();
    if lab.is_empty() {
        return Err(PaletteError::failure(
            AlgorithmId::DominantSwatch,
            "no opaque pixels",
        ));
    }

    // a flat image is its own single swatch
    if distinct.len() == 1 {
        return Ok(distinct
            .iter()
            .map(|&[r, g, b]| Srgb::new(r, g, b))
            .filter(|c| is_valid(*c))
            .collect());
    }

    // k-means++ seeding needs at least k distinct points to draw from
    let k = MAX_SWATCHES.min(distinct.len());
    let seed = ctx.rng().random();
    let result = get_kmeans_hamerly(k, MAX_ITERATIONS, CONVERGENCE, false, &lab, seed);
    ctx.checkpoint(AlgorithmId::DominantSwatch)?;

    let mut swatches = Lab::sort_indexed_colors(&result.centroids, &result.indices);
    swatches.retain(|s| s.percentage > 0.0);
    swatches.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));

    let colors: Vec<Color> = swatches
        .iter()
        .map(|s| Srgb::from_color(s.centroid).into_format())
        .filter(|c| is_valid(*c))
        .collect();
    debug!(swatches = swatches.len(), kept = colors.len(), "dominant swatches");
    Ok(colors)
}

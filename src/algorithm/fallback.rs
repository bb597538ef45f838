//! Last-resort sampler used when a strategy fails or comes back empty.

use std::borrow::Cow;

use image::imageops::FilterType;
use palette::Srgb;

use crate::buffer::{ALPHA_THRESHOLD, PixelBuffer};
use crate::color::Color;
use crate::pipeline::remove_exact_duplicates;

const GRID: u32 = 100;
const STRIDE: usize = 4;

/// Every fourth pixel of a 100×100 thumbnail, deduplicated and capped at
/// `target_count`, in scan order.
#[must_use]
pub fn grid_sample(buffer: &PixelBuffer, target_count: usize) -> Vec<Color> {
    let source = buffer.as_image();
    let thumb = if source.dimensions() == (GRID, GRID) {
        Cow::Borrowed(source)
    } else {
        Cow::Owned(image::imageops::resize(source, GRID, GRID, FilterType::Triangle))
    };

    let sampled: Vec<Color> = thumb
        .pixels()
        .step_by(STRIDE)
        .filter(|p| p[3] > ALPHA_THRESHOLD)
        .map(|p| Srgb::new(p[0], p[1], p[2]))
        .collect();
    let mut unique = remove_exact_duplicates(&sampled);
    unique.truncate(target_count);
    unique
}

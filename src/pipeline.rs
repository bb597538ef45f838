//! Turns a raw, unranked candidate list into a palette of a fixed size:
//! exact dedup, noise filtering, importance ranking, greedy perceptual
//! spreading, then truncation or jitter padding.

use std::collections::HashSet;

use palette::Srgb;
use rand::Rng;
use tracing::debug;

use crate::color::{Color, MID_GRAY, to_hex, to_hsl};
use crate::distance::{DistanceMode, distance};
use crate::validity::is_valid;

/// Minimum distance between two kept colors in the general pass.
pub const SIMILARITY_THRESHOLD: f32 = 15.0;
/// Largest offset applied to every channel when synthesizing padding colors.
pub const JITTER: i16 = 30;
/// Consecutive jitter collisions tolerated before padding gives up, rather
/// than stopping at the first one.
const MAX_PADDING_COLLISIONS: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteEntry {
    pub color: Color,
    /// Produced by jitter padding rather than taken from the image.
    pub synthesized: bool,
}

/// Ordered, duplicate-free colors, most important first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    /// Builds a palette of extracted colors, dropping exact repeats.
    #[must_use]
    pub fn from_colors(colors: impl IntoIterator<Item = Color>) -> Self {
        let mut seen = HashSet::new();
        let entries = colors
            .into_iter()
            .filter(|c| seen.insert(key(*c)))
            .map(|color| PaletteEntry {
                color,
                synthesized: false,
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn colors(&self) -> impl ExactSizeIterator<Item = Color> + '_ {
        self.entries.iter().map(|e| e.color)
    }

    #[must_use]
    pub fn to_hex(&self) -> Vec<String> {
        self.colors().map(to_hex).collect()
    }

    #[must_use]
    pub fn dominant(&self) -> Option<Color> {
        self.entries.first().map(|e| e.color)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key(color: Color) -> [u8; 3] {
    [color.red, color.green, color.blue]
}

/// Keeps the first occurrence of every color.
#[must_use]
pub fn remove_exact_duplicates(colors: &[Color]) -> Vec<Color> {
    let mut seen = HashSet::with_capacity(colors.len());
    colors
        .iter()
        .copied()
        .filter(|c| seen.insert(key(*c)))
        .collect()
}

/// `saturation × (1 − |lightness − 50| / 50)`: vivid, mid-lightness colors
/// score highest.
#[must_use]
pub fn importance(color: Color) -> f32 {
    let hsl = to_hsl(color).rounded();
    hsl.saturation * (1.0 - (hsl.lightness - 50.0).abs() / 50.0)
}

/// Stable sort, highest importance first.
pub fn rank_by_importance(colors: &mut [Color]) {
    colors.sort_by(|a, b| importance(*b).total_cmp(&importance(*a)));
}

/// Greedy pass: a color survives if it is at least `threshold` away from
/// every color already kept. Input order decides who wins a conflict.
#[must_use]
pub fn keep_distinct(colors: &[Color], threshold: f32, mode: DistanceMode) -> Vec<Color> {
    let mut kept: Vec<Color> = Vec::with_capacity(colors.len());
    for &color in colors {
        if kept.iter().all(|&k| distance(color, k, mode) >= threshold) {
            kept.push(color);
        }
    }
    kept
}

/// Dedup, drop noise, rank by importance, then spread perceptually.
#[must_use]
pub fn filter_similar(colors: &[Color], threshold: f32, mode: DistanceMode) -> Vec<Color> {
    let mut valid: Vec<Color> = remove_exact_duplicates(colors)
        .into_iter()
        .filter(|c| is_valid(*c))
        .collect();
    rank_by_importance(&mut valid);
    keep_distinct(&valid, threshold, mode)
}

/// Runs the full pipeline and sizes the result to `target_count`.
///
/// Under-filled results are padded with jittered copies of the kept colors
/// (mid gray when nothing survived filtering). Padding stops early after
/// repeated collisions, so a heavily clamped input can come back short.
pub fn ensure_unique_palette<R: Rng + ?Sized>(
    colors: &[Color],
    target_count: usize,
    rng: &mut R,
) -> Palette {
    let kept = filter_similar(colors, SIMILARITY_THRESHOLD, DistanceMode::Ciede2000);
    let mut palette = Palette::from_colors(kept.iter().copied().take(target_count));
    if palette.len() >= target_count {
        return palette;
    }

    let mut seen: HashSet<[u8; 3]> = palette.colors().map(key).collect();
    let mut collisions = 0;
    while palette.entries.len() < target_count {
        let base = if kept.is_empty() {
            MID_GRAY
        } else {
            kept[palette.entries.len() % kept.len()]
        };
        let candidate = jitter(base, rng);
        if seen.insert(key(candidate)) {
            palette.entries.push(PaletteEntry {
                color: candidate,
                synthesized: true,
            });
            collisions = 0;
        } else {
            collisions += 1;
            if collisions >= MAX_PADDING_COLLISIONS {
                debug!(
                    len = palette.entries.len(),
                    target_count, "padding gave up after repeated collisions"
                );
                break;
            }
        }
    }
    palette
}

/// Shifts all three channels by the same offset, so grays stay gray.
fn jitter<R: Rng + ?Sized>(base: Color, rng: &mut R) -> Color {
    let offset = rng.random_range(-JITTER..=JITTER);
    let shift = |channel: u8| (i16::from(channel) + offset).clamp(0, 255) as u8;
    Srgb::new(shift(base.red), shift(base.green), shift(base.blue))
}

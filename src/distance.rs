use palette::{Oklab, color_difference::Ciede2000};

use crate::color::{Color, to_lab, to_oklab};

/// OKLab distances are scaled by this factor so both metrics share CIEDE2000's
/// order of magnitude (roughly 0..100 across the sRGB gamut).
pub const OKLAB_SCALE: f32 = 100.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DistanceMode {
    /// ΔE00 in CIE Lab. Accurate, several trig calls per pair.
    #[default]
    Ciede2000,
    /// Scaled Euclidean distance in OKLab. Used in per-pixel loops.
    Oklab,
}

#[must_use]
pub fn distance(a: Color, b: Color, mode: DistanceMode) -> f32 {
    match mode {
        DistanceMode::Ciede2000 => to_lab(a).difference(to_lab(b)),
        DistanceMode::Oklab => oklab_distance(to_oklab(a), to_oklab(b)) * OKLAB_SCALE,
    }
}

/// Unscaled Euclidean distance between two OKLab points.
#[inline]
#[must_use]
pub fn oklab_distance(a: Oklab, b: Oklab) -> f32 {
    oklab_distance_sq(a, b).sqrt()
}

#[inline]
#[must_use]
pub fn oklab_distance_sq(a: Oklab, b: Oklab) -> f32 {
    let dl = a.l - b.l;
    let da = a.a - b.a;
    let db = a.b - b.b;
    dl * dl + da * da + db * db
}

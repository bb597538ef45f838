use crate::color::{Color, to_hsl};

const MIN_LIGHTNESS: f32 = 5.0;
const MAX_LIGHTNESS: f32 = 95.0;
const MIN_SATURATION: f32 = 10.0;
/// Channels closer than this to each other read as gray.
const GRAY_SPREAD: u8 = 10;
const MIN_EXTREME_DISTANCE: f32 = 30.0;

/// True when every pairwise channel difference is below the gray threshold.
#[must_use]
pub fn is_grayish(color: Color) -> bool {
    color.red.abs_diff(color.green) < GRAY_SPREAD
        && color.green.abs_diff(color.blue) < GRAY_SPREAD
        && color.red.abs_diff(color.blue) < GRAY_SPREAD
}

/// Accepts a color unless it looks like compression or anti-aliasing noise:
/// near-black or near-white lightness, a washed-out tint of a chromatic color,
/// or anything within 30 RGB units of pure black or white. Grays skip the
/// saturation check so grayscale images keep their palette.
#[must_use]
pub fn is_valid(color: Color) -> bool {
    let hsl = to_hsl(color).rounded();
    if hsl.lightness < MIN_LIGHTNESS || hsl.lightness > MAX_LIGHTNESS {
        return false;
    }

    if !is_grayish(color) && hsl.saturation < MIN_SATURATION {
        return false;
    }

    let from_black = euclid(color, [0, 0, 0]);
    let from_white = euclid(color, [255, 255, 255]);
    from_black >= MIN_EXTREME_DISTANCE && from_white >= MIN_EXTREME_DISTANCE
}

fn euclid(color: Color, other: [u8; 3]) -> f32 {
    let dr = f32::from(color.red) - f32::from(other[0]);
    let dg = f32::from(color.green) - f32::from(other[1]);
    let db = f32::from(color.blue) - f32::from(other[2]);
    (dr * dr + dg * dg + db * db).sqrt()
}

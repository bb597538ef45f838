use crate::buffer::{PixelBuffer, opaque_pixels};
use crate::color::{Color, from_f32_channels};
use crate::error::{PaletteError, Result};

use super::AlgorithmId;

const MAX_SIDE: u32 = 800;

/// Single arithmetic mean over every opaque pixel.
pub(super) fn extract(buffer: &PixelBuffer) -> Result<Vec<Color>> {
    let image = buffer.downscaled(MAX_SIDE);
    let (mut r, mut g, mut b, mut n) = (0u64, 0u64, 0u64, 0u64);
    for (_, _, c) in opaque_pixels(&image) {
        r += u64::from(c.red);
        g += u64::from(c.green);
        b += u64::from(c.blue);
        n += 1;
    }
    if n == 0 {
        return Err(PaletteError::failure(AlgorithmId::Average, "no opaque pixels"));
    }
    let n = n as f32;
    Ok(vec![from_f32_channels(r as f32 / n, g as f32 / n, b as f32 / n)])
}

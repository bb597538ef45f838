use crate::buffer::{PixelBuffer, opaque_pixels};
use crate::color::{Color, from_f32_channels};
use crate::error::{PaletteError, Result};

use super::AlgorithmId;

const MAX_SIDE: u32 = 300;
const TARGET_BUCKETS: usize = 6;

/// A run of pixels owned by exactly one bucket.
#[derive(Debug)]
struct Bucket {
    pixels: Vec<[u8; 3]>,
}

impl Bucket {
    /// `(channel, max - min)` for the channel with the widest spread.
    fn widest_channel(&self) -> (usize, u8) {
        let mut min = [u8::MAX; 3];
        let mut max = [u8::MIN; 3];
        for px in &self.pixels {
            for c in 0..3 {
                min[c] = min[c].min(px[c]);
                max[c] = max[c].max(px[c]);
            }
        }
        (0..3)
            .map(|c| (c, max[c].saturating_sub(min[c])))
            .fold((0, 0), |best, cur| if cur.1 > best.1 { cur } else { best })
    }

    /// Sorts along `channel` and splits at the median.
    fn split(mut self, channel: usize) -> (Self, Self) {
        self.pixels.sort_by_key(|px| px[channel]);
        let upper = self.pixels.split_off(self.pixels.len() / 2);
        (self, Self { pixels: upper })
    }

    fn average(&self) -> Option<Color> {
        if self.pixels.is_empty() {
            return None;
        }
        let mut sum = [0u64; 3];
        for px in &self.pixels {
            for c in 0..3 {
                sum[c] += u64::from(px[c]);
            }
        }
        let n = self.pixels.len() as f32;
        Some(from_f32_channels(
            sum[0] as f32 / n,
            sum[1] as f32 / n,
            sum[2] as f32 / n,
        ))
    }
}

/// Repeatedly halves the bucket with the single widest channel range until
/// there are six buckets or nothing left to split, then averages each bucket.
pub(super) fn extract(buffer: &PixelBuffer) -> Result<Vec<Color>> {
    let image = buffer.downscaled(MAX_SIDE);
    let pixels: Vec<[u8; 3]> = opaque_pixels(&image)
        .map(|(_, _, c)| [c.red, c.green, c.blue])
        .collect();
    if pixels.is_empty() {
        return Err(PaletteError::failure(AlgorithmId::MedianCut, "no opaque pixels"));
    }
    let total = pixels.len();

    let mut buckets = vec![Bucket { pixels }];
    while buckets.len() < TARGET_BUCKETS && buckets.len() < total {
        let widest = buckets
            .iter()
            .enumerate()
            .filter(|(_, b)| b.pixels.len() > 1)
            .map(|(i, b)| (i, b.widest_channel()))
            // first bucket wins ties
            .fold(None, |best: Option<(usize, (usize, u8))>, cur| match best {
                Some(b) if b.1.1 >= cur.1.1 => Some(b),
                _ => Some(cur),
            });

        let Some((index, (channel, range))) = widest else {
            break;
        };
        if range == 0 {
            break;
        }

        let (lower, upper) = buckets.remove(index).split(channel);
        buckets.insert(index, upper);
        buckets.insert(index, lower);
    }

    Ok(buckets.iter().filter_map(Bucket::average).collect())
}

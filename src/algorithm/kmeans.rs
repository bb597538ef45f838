//! RGB-space k-means with k-means++ seeding, shared by the standard and the
//! center-weighted variants.

use palette::{Oklab, Srgb};
use rand::Rng;
use tracing::debug;

use crate::buffer::{ALPHA_THRESHOLD, PixelBuffer, center_weight, opaque_pixels};
use crate::color::{Color, from_f32_channels, to_oklab};
use crate::distance::oklab_distance_sq;
use crate::error::{PaletteError, Result};

use super::{AlgorithmId, ExtractContext};

/// Centroids moving at most this far (RGB units) count as settled.
const CONVERGENCE: f32 = 1.0;

#[derive(Clone, Copy, Debug)]
struct Sample {
    rgb: [f32; 3],
    oklab: Oklab,
    weight: f32,
}

impl Sample {
    fn new(color: Color, weight: f32) -> Self {
        Self {
            rgb: [
                f32::from(color.red),
                f32::from(color.green),
                f32::from(color.blue),
            ],
            oklab: to_oklab(color),
            weight,
        }
    }
}

/// How a sample picks its cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Assignment {
    /// Perceptual distance between the sample and the centroid's OKLab image.
    Oklab,
    /// Plain Euclidean distance in RGB.
    Rgb,
}

#[derive(Clone, Copy, Debug)]
struct KMeans {
    algorithm: AlgorithmId,
    k: usize,
    max_iterations: usize,
    assignment: Assignment,
}

/// k = 8 over every second opaque pixel of a 400px working copy, clusters
/// assigned by OKLab distance.
pub(super) fn extract_standard(buffer: &PixelBuffer, ctx: &mut ExtractContext) -> Result<Vec<Color>> {
    let image = buffer.downscaled(400);
    let samples: Vec<Sample> = image
        .enumerate_pixels()
        .step_by(2)
        .filter(|(_, _, p)| p[3] > ALPHA_THRESHOLD)
        .map(|(_, _, p)| Sample::new(Srgb::new(p[0], p[1], p[2]), 1.0))
        .collect();

    KMeans {
        algorithm: AlgorithmId::KMeans,
        k: 8,
        max_iterations: 20,
        assignment: Assignment::Oklab,
    }
    .run(&samples, ctx)
}

/// k = 6 over a 300px working copy; pixels near the center count up to twice
/// as much as the corners, both in seeding and in the centroid means.
pub(super) fn extract_weighted(buffer: &PixelBuffer, ctx: &mut ExtractContext) -> Result<Vec<Color>> {
    let image = buffer.downscaled(300);
    let (w, h) = image.dimensions();
    let samples: Vec<Sample> = opaque_pixels(&image)
        .map(|(x, y, c)| Sample::new(c, center_weight(x, y, w, h, 0.5)))
        .collect();

    KMeans {
        algorithm: AlgorithmId::WeightedKMeans,
        k: 6,
        max_iterations: 15,
        assignment: Assignment::Rgb,
    }
    .run(&samples, ctx)
}

impl KMeans {
    fn run(self, samples: &[Sample], ctx: &mut ExtractContext) -> Result<Vec<Color>> {
        if samples.is_empty() {
            return Err(PaletteError::failure(self.algorithm, "no opaque pixels"));
        }

        let mut centroids = seed_plus_plus(samples, self.k, ctx.rng());
        let mut sums = vec![[0.0f32; 4]; centroids.len()];

        for iteration in 0..self.max_iterations {
            ctx.checkpoint(self.algorithm)?;

            let targets: Vec<Oklab> = match self.assignment {
                Assignment::Oklab => centroids
                    .iter()
                    .map(|c| to_oklab(from_f32_channels(c[0], c[1], c[2])))
                    .collect(),
                Assignment::Rgb => Vec::new(),
            };

            sums.iter_mut().for_each(|s| *s = [0.0; 4]);
            for sample in samples {
                let nearest = match self.assignment {
                    Assignment::Oklab => nearest_by(&targets, |t| oklab_distance_sq(sample.oklab, *t)),
                    Assignment::Rgb => nearest_by(&centroids, |c| rgb_distance_sq(sample.rgb, *c)),
                };
                let sum = &mut sums[nearest];
                for channel in 0..3 {
                    sum[channel] += sample.rgb[channel] * sample.weight;
                }
                sum[3] += sample.weight;
            }

            let mut converged = true;
            for (centroid, sum) in centroids.iter_mut().zip(&sums) {
                if sum[3] <= 0.0 {
                    continue;
                }
                let updated = [
                    (sum[0] / sum[3]).round(),
                    (sum[1] / sum[3]).round(),
                    (sum[2] / sum[3]).round(),
                ];
                if rgb_distance_sq(*centroid, updated).sqrt() > CONVERGENCE {
                    converged = false;
                }
                *centroid = updated;
            }

            if converged {
                debug!(algorithm = %self.algorithm, iteration, "k-means converged");
                break;
            }
        }

        Ok(centroids
            .iter()
            .map(|c| from_f32_channels(c[0], c[1], c[2]))
            .collect())
    }
}

/// k-means++: the first centroid is drawn by sample weight, each further one
/// with probability proportional to `weight × d²` to the nearest centroid so far.
/// Stops early when every sample already coincides with a centroid.
fn seed_plus_plus<R: Rng + ?Sized>(samples: &[Sample], k: usize, rng: &mut R) -> Vec<[f32; 3]> {
    let mut centroids = Vec::with_capacity(k);
    let total: f32 = samples.iter().map(|s| s.weight).sum();
    let first = pick_weighted(samples.iter().map(|s| s.weight), total, rng);
    centroids.push(samples[first].rgb);

    let mut nearest: Vec<f32> = samples
        .iter()
        .map(|s| rgb_distance_sq(s.rgb, centroids[0]))
        .collect();
    while centroids.len() < k {
        let scores = || samples.iter().zip(&nearest).map(|(s, d)| d * s.weight);
        let total: f32 = scores().sum();
        if total <= 0.0 {
            break;
        }
        let chosen = samples[pick_weighted(scores(), total, rng)].rgb;
        centroids.push(chosen);
        for (d, s) in nearest.iter_mut().zip(samples) {
            *d = d.min(rgb_distance_sq(s.rgb, chosen));
        }
    }
    centroids
}

/// Roulette-wheel selection over non-negative weights summing to `total`.
pub(super) fn pick_weighted<R: Rng + ?Sized>(
    weights: impl Iterator<Item = f32>,
    total: f32,
    rng: &mut R,
) -> usize {
    let target = rng.random::<f32>() * total;
    let mut acc = 0.0;
    let mut last = 0;
    for (i, w) in weights.enumerate() {
        if w <= 0.0 {
            continue;
        }
        acc += w;
        last = i;
        if acc >= target {
            return i;
        }
    }
    last
}

fn nearest_by<T>(candidates: &[T], dist: impl Fn(&T) -> f32) -> usize {
    candidates
        .iter()
        .map(dist)
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map_or(0, |(i, _)| i)
}

fn rgb_distance_sq(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

#[cfg(test)]
mod test {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn stripes(colors: &[[u8; 3]], width: u32, height: u32) -> PixelBuffer {
        let mut data = Vec::new();
        for y in 0..height {
            for _ in 0..width {
                let [r, g, b] = colors[(y as usize * colors.len()) / height as usize];
                data.extend_from_slice(&[r, g, b, 255]);
            }
        }
        PixelBuffer::new(width, height, data).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn seeding_never_repeats_a_point_while_others_remain() {
        let samples: Vec<Sample> = [[255, 0, 0], [0, 255, 0], [0, 0, 255]]
            .iter()
            .map(|&[r, g, b]| Sample::new(Srgb::new(r, g, b), 1.0))
            .collect();
        let mut rng = StdRng::seed_from_u64(11);
        let seeds = seed_plus_plus(&samples, 8, &mut rng);
        assert_eq!(seeds.len(), 3);
        for (i, a) in seeds.iter().enumerate() {
            for b in &seeds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn standard_finds_both_stripes() {
        let buffer = stripes(&[[220, 30, 30], [30, 60, 220]], 20, 20);
        let centroids = extract_standard(&buffer, &mut ExtractContext::seeded(1))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(centroids.contains(&Srgb::new(220, 30, 30)));
        assert!(centroids.contains(&Srgb::new(30, 60, 220)));
    }

    #[test]
    fn weighted_finds_both_stripes() {
        let buffer = stripes(&[[40, 180, 60], [240, 200, 40], [120, 40, 160]], 30, 30);
        let centroids = extract_weighted(&buffer, &mut ExtractContext::seeded(9))
            .unwrap_or_else(|e| panic!("{e}"));
        for expected in [Srgb::new(40, 180, 60), Srgb::new(240, 200, 40), Srgb::new(120, 40, 160)] {
            assert!(centroids.contains(&expected), "{centroids:?}");
        }
    }

    #[test]
    fn transparent_input_fails() {
        let buffer = PixelBuffer::new(2, 1, vec![0; 8]).unwrap_or_else(|e| panic!("{e}"));
        assert!(extract_weighted(&buffer, &mut ExtractContext::seeded(0)).is_err());
    }
}

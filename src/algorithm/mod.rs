//! The seven peer extraction strategies. Each one takes a pixel buffer and
//! returns an unranked list of raw candidates; ranking, filtering and sizing
//! happen afterwards in [`crate::pipeline`].

use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::buffer::PixelBuffer;
use crate::cancel::CancelToken;
use crate::color::Color;
use crate::error::{PaletteError, Result};

mod average;
pub mod fallback;
mod kmeans;
mod median_cut;
mod octree;
mod perceptual;
mod swatch;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum AlgorithmId {
    DominantSwatch,
    Average,
    #[cfg_attr(feature = "serde", serde(rename = "kmeans"))]
    KMeans,
    #[cfg_attr(feature = "serde", serde(rename = "weighted-kmeans"))]
    WeightedKMeans,
    MedianCut,
    Octree,
    #[default]
    Perceptual,
    Combined,
}

impl AlgorithmId {
    /// Every single-strategy algorithm, i.e. everything Combined fans out to.
    pub const PEERS: [Self; 7] = [
        Self::DominantSwatch,
        Self::Average,
        Self::KMeans,
        Self::WeightedKMeans,
        Self::MedianCut,
        Self::Octree,
        Self::Perceptual,
    ];

    pub const ALL: [Self; 8] = [
        Self::DominantSwatch,
        Self::Average,
        Self::KMeans,
        Self::WeightedKMeans,
        Self::MedianCut,
        Self::Octree,
        Self::Perceptual,
        Self::Combined,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DominantSwatch => "dominant-swatch",
            Self::Average => "average",
            Self::KMeans => "kmeans",
            Self::WeightedKMeans => "weighted-kmeans",
            Self::MedianCut => "median-cut",
            Self::Octree => "octree",
            Self::Perceptual => "perceptual",
            Self::Combined => "combined",
        }
    }

    /// Median-Cut, Octree and Average never draw random numbers.
    #[must_use]
    pub const fn is_deterministic(self) -> bool {
        matches!(self, Self::Average | Self::MedianCut | Self::Octree)
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmId {
    type Err = PaletteError;

    fn from_str(s: &str) -> Result<Self> {
        let normalised = s.trim().to_ascii_lowercase().replace('_', "-");
        let id = match normalised.as_str() {
            "dominant-swatch" | "vibrant" => Self::DominantSwatch,
            "average" | "fast-average" => Self::Average,
            "kmeans" | "k-means" => Self::KMeans,
            "weighted-kmeans" | "weighted-k-means" => Self::WeightedKMeans,
            "median-cut" => Self::MedianCut,
            "octree" => Self::Octree,
            "perceptual" => Self::Perceptual,
            "combined" => Self::Combined,
            _ => return Err(PaletteError::UnknownAlgorithm(s.to_owned())),
        };
        Ok(id)
    }
}

/// Per-invocation state: the random source and an optional cancellation flag.
#[derive(Debug)]
pub struct ExtractContext {
    rng: StdRng,
    cancel: Option<CancelToken>,
}

impl ExtractContext {
    /// Seeds from OS entropy when `seed` is `None`.
    #[must_use]
    pub fn new(seed: Option<u64>, cancel: Option<CancelToken>) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self { rng, cancel }
    }

    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed), None)
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Independent child context for a task running in parallel with this one.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        Self {
            rng: StdRng::seed_from_u64(self.rng.random()),
            cancel: self.cancel.clone(),
        }
    }

    /// Called between clustering iterations.
    ///
    /// # Errors
    /// When the shared token has been cancelled.
    pub fn checkpoint(&self, algorithm: AlgorithmId) -> Result<()> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(PaletteError::failure(algorithm, "cancelled"));
        }
        Ok(())
    }
}

/// Runs one peer algorithm and returns its raw candidates.
///
/// # Errors
/// `AlgorithmFailure` when the algorithm has nothing to work with, was
/// cancelled, or is `Combined` (which the orchestrator handles itself).
pub fn run(id: AlgorithmId, buffer: &PixelBuffer, ctx: &mut ExtractContext) -> Result<Vec<Color>> {
    ctx.checkpoint(id)?;
    match id {
        AlgorithmId::DominantSwatch => swatch::extract(buffer, ctx),
        AlgorithmId::Average => average::extract(buffer),
        AlgorithmId::KMeans => kmeans::extract_standard(buffer, ctx),
        AlgorithmId::WeightedKMeans => kmeans::extract_weighted(buffer, ctx),
        AlgorithmId::MedianCut => median_cut::extract(buffer),
        AlgorithmId::Octree => octree::extract(buffer),
        AlgorithmId::Perceptual => perceptual::extract(buffer, ctx),
        AlgorithmId::Combined => Err(PaletteError::failure(
            id,
            "combined is not a single extraction strategy",
        )),
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("dominant-swatch", AlgorithmId::DominantSwatch)]
    #[case("vibrant", AlgorithmId::DominantSwatch)]
    #[case("fast-average", AlgorithmId::Average)]
    #[case("KMeans", AlgorithmId::KMeans)]
    #[case("weighted_kmeans", AlgorithmId::WeightedKMeans)]
    #[case("median-cut", AlgorithmId::MedianCut)]
    #[case(" octree ", AlgorithmId::Octree)]
    #[case("perceptual", AlgorithmId::Perceptual)]
    #[case("combined", AlgorithmId::Combined)]
    fn parses(#[case] input: &str, #[case] expected: AlgorithmId) {
        assert_eq!(input.parse::<AlgorithmId>().unwrap_or_else(|e| panic!("{e}")), expected);
    }

    #[test]
    fn display_round_trips() {
        for id in AlgorithmId::ALL {
            assert_eq!(id.to_string().parse::<AlgorithmId>().ok(), Some(id));
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!(matches!(
            "popularity".parse::<AlgorithmId>(),
            Err(PaletteError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn cancelled_context_fails_fast() {
        let token = CancelToken::new();
        token.cancel();
        let mut ctx = ExtractContext::new(Some(1), Some(token));
        let buffer = PixelBuffer::filled(4, 4, palette::Srgb::new(200, 30, 30));
        assert!(matches!(
            run(AlgorithmId::KMeans, &buffer, &mut ctx),
            Err(PaletteError::AlgorithmFailure { algorithm: AlgorithmId::KMeans, .. })
        ));
    }
}

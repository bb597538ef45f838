use rayon::prelude::*;
use tracing::{debug, warn};

use crate::algorithm::{self, AlgorithmId, ExtractContext, fallback::grid_sample};
use crate::analysis::{PaletteAnalysis, analyze};
use crate::buffer::PixelBuffer;
use crate::cancel::CancelToken;
use crate::color::Color;
use crate::error::{PaletteError, Result};
use crate::pipeline::{Palette, ensure_unique_palette};

pub const DEFAULT_TARGET_COUNT: u32 = 6;

#[derive(Clone, Debug)]
pub struct ExtractOptions {
    pub target_count: u32,
    /// Fixes every random choice (seeding, swatch clustering, padding jitter).
    pub seed: Option<u64>,
    pub cancel: Option<CancelToken>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            target_count: DEFAULT_TARGET_COUNT,
            seed: None,
            cancel: None,
        }
    }
}

impl ExtractOptions {
    #[must_use]
    pub const fn with_target_count(mut self, target_count: u32) -> Self {
        self.target_count = target_count;
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// A finished palette together with its analysis.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExtractOutcome {
    pub algorithm: AlgorithmId,
    pub palette: Vec<String>,
    pub analysis: PaletteAnalysis,
}

/// Extracts a palette of `target_count` colors with OS-seeded randomness.
///
/// # Errors
/// See [`extract_with`].
pub fn extract(buffer: &PixelBuffer, algorithm: AlgorithmId, target_count: u32) -> Result<Palette> {
    extract_with(
        buffer,
        algorithm,
        &ExtractOptions::default().with_target_count(target_count),
    )
}

/// Runs `algorithm`, falls back to grid sampling if it fails or finds nothing,
/// and sizes the result through the uniqueness pipeline.
///
/// # Errors
/// `InvalidTargetCount` for a zero target, `EmptyPalette` when not even the
/// fallback sampler finds an opaque pixel.
pub fn extract_with(
    buffer: &PixelBuffer,
    algorithm: AlgorithmId,
    options: &ExtractOptions,
) -> Result<Palette> {
    if options.target_count == 0 {
        return Err(PaletteError::InvalidTargetCount(options.target_count));
    }
    let target_count = options.target_count as usize;
    let mut ctx = ExtractContext::new(options.seed, options.cancel.clone());

    let candidates = match raw_candidates(buffer, algorithm, &mut ctx) {
        Ok(colors) if !colors.is_empty() => colors,
        Ok(_) => {
            warn!(%algorithm, "no candidates, falling back to grid sampling");
            grid_sample(buffer, target_count)
        }
        Err(error) => {
            warn!(%algorithm, %error, "falling back to grid sampling");
            grid_sample(buffer, target_count)
        }
    };
    if candidates.is_empty() {
        return Err(PaletteError::EmptyPalette { algorithm });
    }

    let palette = ensure_unique_palette(&candidates, target_count, ctx.rng());
    if palette.is_empty() {
        return Err(PaletteError::EmptyPalette { algorithm });
    }
    debug!(%algorithm, candidates = candidates.len(), len = palette.len(), "palette ready");
    Ok(palette)
}

/// [`extract_with`] followed by [`analyze`].
///
/// # Errors
/// See [`extract_with`].
pub fn extract_and_analyze(
    buffer: &PixelBuffer,
    algorithm: AlgorithmId,
    options: &ExtractOptions,
) -> Result<ExtractOutcome> {
    let palette = extract_with(buffer, algorithm, options)?;
    let analysis = analyze(&palette).ok_or(PaletteError::EmptyPalette { algorithm })?;
    Ok(ExtractOutcome {
        algorithm,
        palette: palette.to_hex(),
        analysis,
    })
}

/// Unfiltered output of one algorithm; for `Combined`, the concatenated
/// output of every peer that succeeded.
///
/// # Errors
/// `AlgorithmFailure` from the algorithm, or from `Combined` when every peer
/// failed.
pub fn raw_candidates(
    buffer: &PixelBuffer,
    algorithm: AlgorithmId,
    ctx: &mut ExtractContext,
) -> Result<Vec<Color>> {
    match algorithm {
        AlgorithmId::Combined => combined(buffer, ctx),
        id => algorithm::run(id, buffer, ctx),
    }
}

/// Fans out to all seven peers in parallel and concatenates what comes back,
/// in peer order. A failed peer contributes nothing.
fn combined(buffer: &PixelBuffer, ctx: &mut ExtractContext) -> Result<Vec<Color>> {
    let jobs: Vec<(AlgorithmId, ExtractContext)> = AlgorithmId::PEERS
        .iter()
        .map(|&id| (id, ctx.fork()))
        .collect();

    let results: Vec<(AlgorithmId, Result<Vec<Color>>)> = jobs
        .into_par_iter()
        .map(|(id, mut fork)| (id, algorithm::run(id, buffer, &mut fork)))
        .collect();

    let mut union = Vec::new();
    for (id, result) in results {
        match result {
            Ok(colors) => {
                debug!(algorithm = %id, candidates = colors.len(), "peer finished");
                union.extend(colors);
            }
            Err(error) => warn!(algorithm = %id, %error, "peer dropped from combined"),
        }
    }

    if union.is_empty() {
        return Err(PaletteError::failure(
            AlgorithmId::Combined,
            "no peer produced candidates",
        ));
    }
    Ok(union)
}

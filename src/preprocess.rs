use tracing::debug;

use crate::buffer::{PixelBuffer, fit_within};
use crate::error::Result;

pub const RESIZE_CAP: u32 = 800;
pub const BLUR_SIGMA: f32 = 1.0;
pub const CONTRAST_FACTOR: f32 = 1.2;

/// Input transforms applied to a buffer before extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreprocessOptions {
    /// Shrink so the longest side is at most 800 px.
    pub resize: bool,
    pub blur: bool,
    /// Scale every RGB channel by 1.2, saturating at 255.
    pub contrast: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            resize: true,
            blur: false,
            contrast: false,
        }
    }
}

impl PreprocessOptions {
    /// Everything off; the buffer passes through untouched.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            resize: false,
            blur: false,
            contrast: false,
        }
    }

    #[must_use]
    pub const fn is_noop(&self) -> bool {
        !self.resize && !self.blur && !self.contrast
    }
}

/// Resize, then blur, then boost contrast, as enabled in `options`.
///
/// # Errors
/// Only if the transformed image ends up with a zero dimension, which the
/// transforms here never produce for a valid input.
pub fn preprocess(buffer: PixelBuffer, options: &PreprocessOptions) -> Result<PixelBuffer> {
    if options.is_noop() {
        return Ok(buffer);
    }
    let mut image = buffer.into_image();
    if options.resize {
        image = fit_within(&image, RESIZE_CAP).into_owned();
    }
    if options.blur {
        image = image::imageops::blur(&image, BLUR_SIGMA);
    }
    if options.contrast {
        for px in image.pixels_mut() {
            for channel in &mut px.0[..3] {
                *channel = (f32::from(*channel) * CONTRAST_FACTOR).round().min(255.0) as u8;
            }
        }
    }
    debug!(width = image.width(), height = image.height(), ?options, "preprocessed");
    PixelBuffer::from_image(image)
}

use std::borrow::Cow;

use image::{RgbaImage, imageops::FilterType};
use palette::Srgb;

use crate::color::Color;
use crate::error::{PaletteError, Result};

/// Pixels with alpha at or below this are never sampled.
pub const ALPHA_THRESHOLD: u8 = 128;

/// A decoded RGBA image, row-major, validated on construction.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    /// # Errors
    /// When a dimension is zero or `data` is not exactly `width * height * 4` bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let len = data.len();
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4));
        if width == 0 || height == 0 || expected != Some(len) {
            return Err(PaletteError::InvalidBuffer { len, width, height });
        }
        RgbaImage::from_raw(width, height, data)
            .map(|image| Self { image })
            .ok_or(PaletteError::InvalidBuffer { len, width, height })
    }

    /// # Errors
    /// When the image is empty.
    pub fn from_image(image: RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PaletteError::InvalidBuffer {
                len: image.as_raw().len(),
                width,
                height,
            });
        }
        Ok(Self { image })
    }

    /// Solid fill, handy for tests and previews.
    #[must_use]
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let pixel = image::Rgba([color.red, color.green, color.blue, 255]);
        Self {
            image: RgbaImage::from_pixel(width.max(1), height.max(1), pixel),
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[must_use]
    pub const fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Shrinks (never enlarges) so the longest side is at most `max_side`,
    /// keeping the aspect ratio.
    #[must_use]
    pub fn downscaled(&self, max_side: u32) -> Cow<'_, RgbaImage> {
        fit_within(&self.image, max_side)
    }
}

pub(crate) fn fit_within(image: &RgbaImage, max_side: u32) -> Cow<'_, RgbaImage> {
    let (w, h) = image.dimensions();
    let longest = w.max(h);
    if longest <= max_side {
        return Cow::Borrowed(image);
    }
    let ratio = max_side as f32 / longest as f32;
    let out_w = ((w as f32) * ratio).round().max(1.0) as u32;
    let out_h = ((h as f32) * ratio).round().max(1.0) as u32;
    Cow::Owned(image::imageops::resize(image, out_w, out_h, FilterType::Triangle))
}

/// `(x, y, color)` for every pixel above the alpha threshold.
pub fn opaque_pixels(image: &RgbaImage) -> impl Iterator<Item = (u32, u32, Color)> + '_ {
    image
        .enumerate_pixels()
        .filter(|(_, _, p)| p[3] > ALPHA_THRESHOLD)
        .map(|(x, y, p)| (x, y, Srgb::new(p[0], p[1], p[2])))
}

/// Linear falloff from 1 at the image center to `1 - falloff` at the corners.
#[must_use]
pub fn center_weight(x: u32, y: u32, width: u32, height: u32, falloff: f32) -> f32 {
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let max = cx.hypot(cy);
    if max <= f32::EPSILON {
        return 1.0;
    }
    let d = (x as f32 - cx).hypot(y as f32 - cy);
    1.0 - (d / max) * falloff
}

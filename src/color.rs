use palette::{FromColor, Hsl, Lab, Oklab, Srgb};

use crate::error::{PaletteError, Result};

/// A palette entry. Everything the crate hands out is an 8-bit sRGB triple;
/// the Lab/OKLab/HSL projections below are derived on demand.
pub type Color = Srgb<u8>;

pub const MID_GRAY: Color = Srgb::new(0x80, 0x80, 0x80);

/// Hue in degrees `[0, 360)`, saturation and lightness in percent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HslColor {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl HslColor {
    /// Whole-degree / whole-percent version, which is what the noise filter,
    /// the importance score and the analysis compare against.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            hue: self.hue.round() % 360.0,
            saturation: self.saturation.round(),
            lightness: self.lightness.round(),
        }
    }
}

/// Six uppercase hex digits, no leading `#`.
#[must_use]
pub fn to_hex(color: Color) -> String {
    format!("{:02X}{:02X}{:02X}", color.red, color.green, color.blue)
}

/// Parses `RRGGBB`, with or without a leading `#`.
pub fn from_hex(hex: &str) -> Result<Color> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PaletteError::InvalidHex(hex.to_owned()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| PaletteError::InvalidHex(hex.to_owned()))
    };
    Ok(Srgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[must_use]
pub fn to_hsl(color: Color) -> HslColor {
    let hsl: Hsl = Hsl::from_color(color.into_format::<f32>());
    HslColor {
        hue: hsl.hue.into_positive_degrees() % 360.0,
        saturation: hsl.saturation * 100.0,
        lightness: hsl.lightness * 100.0,
    }
}

/// Inverse of [`to_hsl`]; saturation and lightness are clamped to `0..=100`.
#[must_use]
pub fn hsl_to_color(hue: f32, saturation: f32, lightness: f32) -> Color {
    let hsl: Hsl = Hsl::new(
        hue.rem_euclid(360.0),
        saturation.clamp(0.0, 100.0) / 100.0,
        lightness.clamp(0.0, 100.0) / 100.0,
    );
    Srgb::from_color(hsl).into_format()
}

/// CIE L*a*b* under D65.
#[must_use]
pub fn to_lab(color: Color) -> Lab {
    Lab::from_color(color.into_format::<f32>())
}

#[must_use]
pub fn to_oklab(color: Color) -> Oklab {
    Oklab::from_color(color.into_format::<f32>())
}

/// Largest pairwise channel difference.
#[must_use]
pub fn channel_spread(color: Color) -> u8 {
    let max = color.red.max(color.green).max(color.blue);
    let min = color.red.min(color.green).min(color.blue);
    max - min
}

pub(crate) fn from_f32_channels(r: f32, g: f32, b: f32) -> Color {
    let clamp = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    Srgb::new(clamp(r), clamp(g), clamp(b))
}

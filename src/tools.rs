//! Palette manipulation helpers: tint/shade scales, HSL adjustments and
//! CSS-ready formatting.

use std::fmt;
use std::str::FromStr;

use crate::color::{Color, hsl_to_color, to_hsl};
use crate::error::{PaletteError, Result};
use crate::pipeline::Palette;

pub const DEFAULT_STEPS: usize = 5;
pub const SCALE_STEPS: usize = 4;
pub const DEFAULT_DIRECTION: &str = "to right";

const MAX_TINT_LIGHTNESS: f32 = 95.0;
const MIN_SHADE_LIGHTNESS: f32 = 5.0;

/// `count` progressively lighter versions of `color`, ending at 95% lightness.
#[must_use]
pub fn tints(color: Color, count: usize) -> Vec<Color> {
    let hsl = to_hsl(color).rounded();
    (1..=count)
        .map(|i| {
            let t = i as f32 / count as f32;
            let lightness = (hsl.lightness + (MAX_TINT_LIGHTNESS - hsl.lightness) * t).min(MAX_TINT_LIGHTNESS);
            hsl_to_color(hsl.hue, hsl.saturation, lightness)
        })
        .collect()
}

/// `count` progressively darker versions of `color`, ending at 5% lightness.
#[must_use]
pub fn shades(color: Color, count: usize) -> Vec<Color> {
    let hsl = to_hsl(color).rounded();
    (1..=count)
        .map(|i| {
            let t = i as f32 / count as f32;
            let lightness = (hsl.lightness - hsl.lightness * t).max(MIN_SHADE_LIGHTNESS);
            hsl_to_color(hsl.hue, hsl.saturation, lightness)
        })
        .collect()
}

/// Darkest shade to lightest tint with `color` in the middle.
#[must_use]
pub fn color_scale(color: Color) -> Vec<Color> {
    let mut scale = shades(color, SCALE_STEPS);
    scale.reverse();
    scale.push(color);
    scale.extend(tints(color, SCALE_STEPS));
    scale
}

/// Shifts HSL saturation by `amount` percentage points.
#[must_use]
pub fn adjust_saturation(color: Color, amount: f32) -> Color {
    let hsl = to_hsl(color).rounded();
    hsl_to_color(hsl.hue, (hsl.saturation + amount).clamp(0.0, 100.0), hsl.lightness)
}

/// Shifts HSL lightness by `amount` percentage points.
#[must_use]
pub fn adjust_brightness(color: Color, amount: f32) -> Color {
    let hsl = to_hsl(color).rounded();
    hsl_to_color(hsl.hue, hsl.saturation, (hsl.lightness + amount).clamp(0.0, 100.0))
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PaletteAdjustments {
    pub saturation: f32,
    pub brightness: f32,
}

/// Applies `adjustments` to every entry, saturation before brightness.
/// Zero adjustments leave colors untouched.
#[must_use]
pub fn adjust_palette(palette: &Palette, adjustments: PaletteAdjustments) -> Vec<Color> {
    palette
        .colors()
        .map(|mut color| {
            if adjustments.saturation != 0.0 {
                color = adjust_saturation(color, adjustments.saturation);
            }
            if adjustments.brightness != 0.0 {
                color = adjust_brightness(color, adjustments.brightness);
            }
            color
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorFormat {
    #[default]
    Hex,
    Rgb,
    Hsl,
}

impl FromStr for ColorFormat {
    type Err = PaletteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hex" => Ok(Self::Hex),
            "rgb" => Ok(Self::Rgb),
            "hsl" => Ok(Self::Hsl),
            _ => Err(PaletteError::UnknownFormat(s.to_owned())),
        }
    }
}

impl fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hex => "hex",
            Self::Rgb => "rgb",
            Self::Hsl => "hsl",
        })
    }
}

/// CSS notation: `#rrggbb`, `rgb(r, g, b)` or `hsl(h, s%, l%)`.
#[must_use]
pub fn format_color(color: Color, format: ColorFormat) -> String {
    match format {
        ColorFormat::Hex => format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue),
        ColorFormat::Rgb => format!("rgb({}, {}, {})", color.red, color.green, color.blue),
        ColorFormat::Hsl => {
            let hsl = to_hsl(color).rounded();
            format!("hsl({}, {}%, {}%)", hsl.hue, hsl.saturation, hsl.lightness)
        }
    }
}

/// A CSS `linear-gradient` running through `colors` in order.
#[must_use]
pub fn linear_gradient(colors: &[Color], direction: &str) -> String {
    let stops: Vec<String> = colors
        .iter()
        .map(|c| format_color(*c, ColorFormat::Hex))
        .collect();
    format!("linear-gradient({direction}, {})", stops.join(", "))
}

#[cfg(test)]
mod test {
    use palette::Srgb;
    use rstest::rstest;

    use super::*;

    const RED: Color = Srgb::new(255, 0, 0);

    fn lightness(c: &Color) -> f32 {
        to_hsl(*c).lightness
    }

    #[test]
    fn tints_climb_towards_light() {
        let tints = tints(RED, DEFAULT_STEPS);
        assert_eq!(tints.len(), DEFAULT_STEPS);
        assert!(tints.windows(2).all(|w| lightness(&w[0]) < lightness(&w[1])));
        assert!(lightness(&tints[0]) > 50.0);
        assert!((lightness(&tints[4]) - MAX_TINT_LIGHTNESS).abs() < 1.0);
    }

    #[test]
    fn shades_stop_at_floor() {
        let shades = shades(RED, DEFAULT_STEPS);
        assert_eq!(shades.len(), DEFAULT_STEPS);
        assert!(shades.windows(2).all(|w| lightness(&w[0]) > lightness(&w[1])));
        assert!((lightness(&shades[4]) - MIN_SHADE_LIGHTNESS).abs() < 1.0);
    }

    #[test]
    fn scale_is_centered_on_input() {
        let scale = color_scale(RED);
        assert_eq!(scale.len(), SCALE_STEPS * 2 + 1);
        assert_eq!(scale[SCALE_STEPS], RED);
        assert!(scale.windows(2).all(|w| lightness(&w[0]) < lightness(&w[1])));
    }

    #[rstest]
    #[case(-100.0, Srgb::new(0, 0, 0))]
    #[case(100.0, Srgb::new(255, 255, 255))]
    fn brightness_clamps(#[case] amount: f32, #[case] expected: Color) {
        assert_eq!(adjust_brightness(RED, amount), expected);
    }

    #[test]
    fn desaturating_fully_yields_gray() {
        let gray = adjust_saturation(Srgb::new(200, 60, 60), -100.0);
        assert_eq!(gray.red, gray.green);
        assert_eq!(gray.green, gray.blue);
    }

    #[test]
    fn zero_adjustments_are_identity() {
        let palette = Palette::from_colors([RED, Srgb::new(12, 140, 90)]);
        let adjusted = adjust_palette(&palette, PaletteAdjustments::default());
        assert_eq!(adjusted, palette.colors().collect::<Vec<_>>());
    }

    #[rstest]
    #[case(ColorFormat::Hex, "#ff0000")]
    #[case(ColorFormat::Rgb, "rgb(255, 0, 0)")]
    #[case(ColorFormat::Hsl, "hsl(0, 100%, 50%)")]
    fn formats(#[case] format: ColorFormat, #[case] expected: &str) {
        assert_eq!(format_color(RED, format), expected);
        assert_eq!(format.to_string().parse::<ColorFormat>().ok(), Some(format));
    }

    #[test]
    fn gradient_lists_stops_in_order() {
        assert_eq!(
            linear_gradient(&[RED, Srgb::new(0, 0, 255)], DEFAULT_DIRECTION),
            "linear-gradient(to right, #ff0000, #0000ff)"
        );
    }
}

//! Harmony colors and temperature classification for a finished palette.

use crate::color::{Color, HslColor, hsl_to_color, to_hsl};
use crate::pipeline::Palette;
use crate::validity::is_grayish;

const ANALOGOUS_STEP: f32 = 30.0;
const WARM_HUES: std::ops::RangeInclusive<f32> = 0.0..=60.0;
const COOL_HUES: std::ops::RangeInclusive<f32> = 180.0..=240.0;
/// Lightness bounds used instead of hue when every entry is gray.
const LIGHT_GRAY: f32 = 60.0;
const DARK_GRAY: f32 = 40.0;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PaletteAnalysis {
    #[cfg_attr(feature = "serde", serde(serialize_with = "hex::color"))]
    pub dominant_color: Color,
    #[cfg_attr(feature = "serde", serde(serialize_with = "hex::color"))]
    pub complementary: Color,
    #[cfg_attr(feature = "serde", serde(serialize_with = "hex::pair"))]
    pub analogous: [Color; 2],
    #[cfg_attr(feature = "serde", serde(serialize_with = "hex::pair"))]
    pub triadic: [Color; 2],
    pub color_count: usize,
    pub is_warm: bool,
    pub is_cool: bool,
    pub is_grayscale: bool,
    pub average_saturation: u8,
    pub average_lightness: u8,
}

/// Derives the analysis record from `palette`; `None` when it is empty.
#[must_use]
pub fn analyze(palette: &Palette) -> Option<PaletteAnalysis> {
    let dominant = palette.dominant()?;
    let hsl: Vec<HslColor> = palette.colors().map(|c| to_hsl(c).rounded()).collect();
    let is_grayscale = palette.colors().all(is_grayish);

    let (mut warm, mut cool) = (0usize, 0usize);
    for c in &hsl {
        let (is_warm, is_cool) = if is_grayscale {
            (c.lightness > LIGHT_GRAY, c.lightness < DARK_GRAY)
        } else {
            (WARM_HUES.contains(&c.hue), COOL_HUES.contains(&c.hue))
        };
        warm += usize::from(is_warm);
        cool += usize::from(is_cool);
    }

    let n = hsl.len() as f32;
    let mean = |f: fn(&HslColor) -> f32| (hsl.iter().map(f).sum::<f32>() / n).round() as u8;
    let base = to_hsl(dominant).rounded();
    let rotate = |degrees: f32| hsl_to_color(base.hue + degrees, base.saturation, base.lightness);

    Some(PaletteAnalysis {
        dominant_color: dominant,
        complementary: complementary(dominant),
        analogous: [rotate(ANALOGOUS_STEP), rotate(-ANALOGOUS_STEP)],
        triadic: [rotate(120.0), rotate(240.0)],
        color_count: hsl.len(),
        is_warm: warm > cool,
        is_cool: cool > warm,
        is_grayscale,
        average_saturation: mean(|c| c.saturation),
        average_lightness: mean(|c| c.lightness),
    })
}

/// Channel-wise `255 - x`.
#[must_use]
pub fn complementary(color: Color) -> Color {
    Color::new(255 - color.red, 255 - color.green, 255 - color.blue)
}

#[cfg(feature = "serde")]
mod hex {
    use serde::Serializer;
    use serde::ser::SerializeSeq;

    use crate::color::{Color, to_hex};

    pub(super) fn color<S: Serializer>(color: &Color, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_hex(*color))
    }

    pub(super) fn pair<S: Serializer>(colors: &[Color; 2], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(colors.len()))?;
        for c in colors {
            seq.serialize_element(&to_hex(*c))?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod test {
    use palette::Srgb;
    use rstest::rstest;

    use super::*;
    use crate::color::to_hex;

    #[test]
    fn empty_palette_has_no_analysis() {
        assert_eq!(analyze(&Palette::from_colors([])), None);
    }

    #[test]
    fn pure_red() {
        let palette = Palette::from_colors([Srgb::new(255, 0, 0)]);
        let analysis = analyze(&palette).unwrap_or_else(|| panic!("non-empty"));
        assert_eq!(to_hex(analysis.dominant_color), "FF0000");
        assert_eq!(to_hex(analysis.complementary), "00FFFF");
        let hue = |c: Color| to_hsl(c).rounded().hue;
        assert_eq!(analysis.analogous.map(hue), [30.0, 330.0]);
        assert_eq!(analysis.triadic.map(hue), [120.0, 240.0]);
        assert_eq!(analysis.color_count, 1);
        assert!(analysis.is_warm);
        assert!(!analysis.is_cool);
        assert!(!analysis.is_grayscale);
        assert_eq!(analysis.average_saturation, 100);
        assert_eq!(analysis.average_lightness, 50);
    }

    #[rstest]
    #[case::light_grays(&[(200, 200, 200), (180, 182, 181)], true, false)]
    #[case::dark_grays(&[(40, 40, 40), (70, 72, 70)], false, true)]
    #[case::mixed_tie(&[(200, 200, 200), (40, 40, 40)], false, false)]
    fn grayscale_temperature_follows_lightness(
        #[case] colors: &[(u8, u8, u8)],
        #[case] warm: bool,
        #[case] cool: bool,
    ) {
        let palette = Palette::from_colors(colors.iter().map(|&(r, g, b)| Srgb::new(r, g, b)));
        let analysis = analyze(&palette).unwrap_or_else(|| panic!("non-empty"));
        assert!(analysis.is_grayscale);
        assert_eq!((analysis.is_warm, analysis.is_cool), (warm, cool));
    }

    #[test]
    fn chromatic_majority_vote() {
        let palette = Palette::from_colors([
            Srgb::new(30, 60, 220),
            Srgb::new(20, 200, 220),
            Srgb::new(230, 120, 20),
        ]);
        let analysis = analyze(&palette).unwrap_or_else(|| panic!("non-empty"));
        assert!(analysis.is_cool);
        assert!(!analysis.is_warm);
        assert_eq!(analysis.color_count, 3);
    }

    #[test]
    fn averages_are_rounded_means() {
        let palette = Palette::from_colors([Srgb::new(255, 0, 0), Srgb::new(128, 128, 128)]);
        let analysis = analyze(&palette).unwrap_or_else(|| panic!("non-empty"));
        assert_eq!(analysis.average_saturation, 50);
        assert_eq!(analysis.average_lightness, 50);
    }
}

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

mod algorithm;
mod analysis;
mod buffer;
mod cancel;
mod color;
mod distance;
mod error;
mod extract;
mod pipeline;
mod preprocess;
mod tools;
mod validity;

pub use algorithm::{AlgorithmId, ExtractContext, fallback::grid_sample};
pub use analysis::{PaletteAnalysis, analyze, complementary};
pub use buffer::{ALPHA_THRESHOLD, PixelBuffer, center_weight, opaque_pixels};
pub use cancel::CancelToken;
pub use color::{Color, HslColor, MID_GRAY, channel_spread, from_hex, hsl_to_color, to_hex, to_hsl, to_lab, to_oklab};
pub use distance::{DistanceMode, OKLAB_SCALE, distance, oklab_distance};
pub use error::{PaletteError, Result};
pub use extract::{
    DEFAULT_TARGET_COUNT, ExtractOptions, ExtractOutcome, extract, extract_and_analyze, extract_with, raw_candidates,
};
pub use pipeline::{
    Palette, PaletteEntry, SIMILARITY_THRESHOLD, ensure_unique_palette, filter_similar, importance, keep_distinct,
    rank_by_importance, remove_exact_duplicates,
};
pub use preprocess::{PreprocessOptions, preprocess};
pub use tools::{
    ColorFormat, DEFAULT_DIRECTION, DEFAULT_STEPS, PaletteAdjustments, adjust_brightness, adjust_palette,
    adjust_saturation, color_scale, format_color, linear_gradient, shades, tints,
};
pub use validity::{is_grayish, is_valid};

// ------------------------------------------------------------
// Browser surface
// ------------------------------------------------------------

fn js_error(e: PaletteError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn hex_array(colors: impl IntoIterator<Item = Color>) -> Array {
    let out = Array::new();
    for c in colors {
        out.push(&JsValue::from_str(&to_hex(c)));
    }
    out
}

fn analysis_object(analysis: &PaletteAnalysis) -> Result<Object, JsValue> {
    let obj = Object::new();
    let set = |key: &str, value: &JsValue| Reflect::set(&obj, &JsValue::from_str(key), value).map(|_| ());
    set("dominantColor", &JsValue::from_str(&to_hex(analysis.dominant_color)))?;
    set("complementary", &JsValue::from_str(&to_hex(analysis.complementary)))?;
    set("analogous", &hex_array(analysis.analogous))?;
    set("triadic", &hex_array(analysis.triadic))?;
    set("colorCount", &JsValue::from_f64(analysis.color_count as f64))?;
    set("isWarm", &JsValue::from_bool(analysis.is_warm))?;
    set("isCool", &JsValue::from_bool(analysis.is_cool))?;
    set("isGrayscale", &JsValue::from_bool(analysis.is_grayscale))?;
    set("averageSaturation", &JsValue::from_f64(f64::from(analysis.average_saturation)))?;
    set("averageLightness", &JsValue::from_f64(f64::from(analysis.average_lightness)))?;
    Ok(obj)
}

/// Extract a palette from raw RGBA pixels (e.g. `ImageData.data`).
///
/// `algorithm` is one of `dominant-swatch`, `average`, `kmeans`,
/// `weighted-kmeans`, `median-cut`, `octree`, `perceptual` or `combined`
/// (default `perceptual`); `target_count` defaults to 6.
///
/// Returns `{ palette: string[], analysis: {...} }` where every palette entry
/// is six uppercase hex digits.
#[wasm_bindgen]
pub fn extract_palette(
    rgba: Vec<u8>,
    width: u32,
    height: u32,
    algorithm: Option<String>,
    target_count: Option<u32>,
) -> Result<Object, JsValue> {
    let algorithm = match algorithm.as_deref() {
        Some(name) => name.parse::<AlgorithmId>().map_err(js_error)?,
        None => AlgorithmId::default(),
    };
    let options = ExtractOptions::default().with_target_count(target_count.unwrap_or(DEFAULT_TARGET_COUNT));
    let buffer = PixelBuffer::new(width, height, rgba).map_err(js_error)?;
    let outcome = extract_and_analyze(&buffer, algorithm, &options).map_err(js_error)?;

    let palette_js = Array::new();
    for hex in &outcome.palette {
        palette_js.push(&JsValue::from_str(hex));
    }

    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("palette"), &palette_js)?;
    let analysis_js = analysis_object(&outcome.analysis)?;
    Reflect::set(&result, &JsValue::from_str("analysis"), &analysis_js)?;
    Ok(result)
}

/// Analysis record for an existing palette given as hex strings, dominant first.
#[wasm_bindgen]
pub fn analyze_palette(palette: Array) -> Result<JsValue, JsValue> {
    let mut colors = Vec::with_capacity(palette.length() as usize);
    for value in palette.iter() {
        let hex = value
            .as_string()
            .ok_or_else(|| JsValue::from_str("palette entries must be strings"))?;
        colors.push(from_hex(&hex).map_err(js_error)?);
    }
    match analyze(&Palette::from_colors(colors)) {
        Some(analysis) => Ok(analysis_object(&analysis)?.into()),
        None => Ok(JsValue::NULL),
    }
}

/// `{ tints, shades, scale }` for a single hex color.
#[wasm_bindgen]
pub fn palette_tools(hex: &str) -> Result<Object, JsValue> {
    let color = from_hex(hex).map_err(js_error)?;
    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("tints"), &hex_array(tints(color, DEFAULT_STEPS)))?;
    Reflect::set(&result, &JsValue::from_str("shades"), &hex_array(shades(color, DEFAULT_STEPS)))?;
    Reflect::set(&result, &JsValue::from_str("scale"), &hex_array(color_scale(color)))?;
    Ok(result)
}

// ------------------------------------------------------------
// Native entry point
// ------------------------------------------------------------

/// Decode an encoded image (PNG, JPEG, ...), preprocess it and extract.
///
/// # Errors
/// `DecodeUnavailable` when the bytes are not a decodable image, otherwise
/// whatever [`extract_and_analyze`] reports.
#[cfg(not(target_arch = "wasm32"))]
pub fn extract_palette_bytes(
    input: &[u8],
    algorithm: AlgorithmId,
    options: &ExtractOptions,
    preprocessing: &PreprocessOptions,
) -> Result<ExtractOutcome> {
    let img = image::load_from_memory(input).map_err(|e| PaletteError::DecodeUnavailable(e.to_string()))?;
    let buffer = preprocess(PixelBuffer::from_image(img.to_rgba8())?, preprocessing)?;
    extract_and_analyze(&buffer, algorithm, options)
}

use image_to_palette_wasm::{
    AlgorithmId, CancelToken, Color, DistanceMode, ExtractContext, ExtractOptions, Palette, PaletteError, PixelBuffer,
    SIMILARITY_THRESHOLD, analyze, distance, extract, extract_with, hsl_to_color, is_valid, raw_candidates, to_hex,
};
use palette::Srgb;
use rstest::{fixture, rstest};

const SEED: u64 = 0x5eed;

fn buffer_from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> PixelBuffer {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&f(x, y));
        }
    }
    PixelBuffer::new(width, height, data).unwrap_or_else(|e| panic!("{e}"))
}

/// Hue sweeps left to right, lightness top to bottom.
#[fixture]
fn sweep() -> PixelBuffer {
    buffer_from_fn(64, 48, |x, y| {
        let c = hsl_to_color(x as f32 * 360.0 / 64.0, 70.0, 30.0 + y as f32 * 40.0 / 48.0);
        [c.red, c.green, c.blue, 255]
    })
}

fn seeded(target_count: u32) -> ExtractOptions {
    ExtractOptions::default().with_target_count(target_count).with_seed(SEED)
}

fn extract_ok(buffer: &PixelBuffer, algorithm: AlgorithmId, options: &ExtractOptions) -> Palette {
    extract_with(buffer, algorithm, options).unwrap_or_else(|e| panic!("{algorithm}: {e}"))
}

#[rstest]
fn palette_has_exactly_target_count(
    sweep: PixelBuffer,
    #[values(
        AlgorithmId::DominantSwatch,
        AlgorithmId::Average,
        AlgorithmId::KMeans,
        AlgorithmId::WeightedKMeans,
        AlgorithmId::MedianCut,
        AlgorithmId::Octree,
        AlgorithmId::Perceptual,
        AlgorithmId::Combined
    )]
    algorithm: AlgorithmId,
    #[values(1, 6, 10)] target_count: u32,
) {
    let palette = extract_ok(&sweep, algorithm, &seeded(target_count));
    assert_eq!(palette.len(), target_count as usize, "{algorithm}");
}

#[rstest]
fn palettes_are_unique_and_valid(sweep: PixelBuffer) {
    for algorithm in AlgorithmId::ALL {
        let palette = extract_ok(&sweep, algorithm, &seeded(8));

        let mut hexes = palette.to_hex();
        hexes.sort();
        hexes.dedup();
        assert_eq!(hexes.len(), palette.len(), "{algorithm} returned duplicates");

        let extracted: Vec<Color> = palette
            .entries()
            .iter()
            .filter(|e| !e.synthesized)
            .map(|e| e.color)
            .collect();
        for (i, a) in extracted.iter().enumerate() {
            assert!(is_valid(*a), "{algorithm}: {} is noise", to_hex(*a));
            for b in &extracted[i + 1..] {
                assert!(distance(*a, *b, DistanceMode::Ciede2000) >= SIMILARITY_THRESHOLD);
            }
        }
    }
}

#[rstest]
#[case::median_cut(AlgorithmId::MedianCut)]
#[case::octree(AlgorithmId::Octree)]
fn deterministic_algorithms_ignore_the_seed(sweep: PixelBuffer, #[case] algorithm: AlgorithmId) {
    assert!(algorithm.is_deterministic());
    let first = raw_candidates(&sweep, algorithm, &mut ExtractContext::seeded(1)).unwrap_or_else(|e| panic!("{e}"));
    let second = raw_candidates(&sweep, algorithm, &mut ExtractContext::seeded(2)).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(first, second);
    assert_eq!(
        extract_ok(&sweep, algorithm, &seeded(6)),
        extract_ok(&sweep, algorithm, &seeded(6))
    );
}

#[rstest]
fn same_seed_same_palette(sweep: PixelBuffer) {
    for algorithm in AlgorithmId::ALL {
        assert_eq!(
            extract_ok(&sweep, algorithm, &seeded(6)),
            extract_ok(&sweep, algorithm, &seeded(6)),
            "{algorithm}"
        );
    }
}

#[rstest]
#[case::average(AlgorithmId::Average)]
#[case::swatch(AlgorithmId::DominantSwatch)]
fn pure_red(#[case] algorithm: AlgorithmId) {
    let red = PixelBuffer::filled(32, 32, Srgb::new(255, 0, 0));
    let candidates =
        raw_candidates(&red, algorithm, &mut ExtractContext::seeded(SEED)).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(candidates.first().copied().map(to_hex).as_deref(), Some("FF0000"));

    let palette = extract_ok(&red, algorithm, &seeded(6));
    assert_eq!(palette.to_hex()[0], "FF0000");
    assert_eq!(palette.entries().iter().filter(|e| !e.synthesized).count(), 1);

    let analysis = analyze(&palette).unwrap_or_else(|| panic!("empty palette"));
    assert_eq!(to_hex(analysis.dominant_color), "FF0000");
    assert_eq!(to_hex(analysis.complementary), "00FFFF");
    assert!(!analysis.is_grayscale);
}

#[test]
fn pure_red_palette_is_warm() {
    let red = PixelBuffer::filled(32, 32, Srgb::new(255, 0, 0));
    let palette = extract_ok(&red, AlgorithmId::Average, &seeded(6));
    assert_eq!(palette.len(), 6);
    let analysis = analyze(&palette).unwrap_or_else(|| panic!("empty palette"));
    assert!(analysis.is_warm);
    assert!(!analysis.is_cool);
}

#[test]
fn pure_gray_survives_filtering() {
    let gray = PixelBuffer::filled(32, 32, Srgb::new(0x80, 0x80, 0x80));
    for seed in 0..20 {
        let options = ExtractOptions::default().with_seed(seed);
        let palette = extract_ok(&gray, AlgorithmId::Average, &options);
        assert_eq!(palette.len(), 6);
        assert_eq!(palette.to_hex()[0], "808080");
        assert!(!palette.entries()[0].synthesized);

        let analysis = analyze(&palette).unwrap_or_else(|| panic!("empty palette"));
        assert!(analysis.is_grayscale, "seed {seed}: {:?}", palette.to_hex());
        assert_eq!(analysis.average_saturation, 0);
    }
}

#[rstest]
#[case::median_cut(AlgorithmId::MedianCut)]
#[case::octree(AlgorithmId::Octree)]
fn black_and_white_is_fully_synthesized(#[case] algorithm: AlgorithmId) {
    let checker = buffer_from_fn(16, 16, |x, y| {
        let v = if (x + y) % 2 == 0 { 0 } else { 255 };
        [v, v, v, 255]
    });
    let palette = extract_ok(&checker, algorithm, &seeded(6));
    assert_eq!(palette.len(), 6);
    assert!(palette.entries().iter().all(|e| e.synthesized));

    let mut hexes = palette.to_hex();
    hexes.sort();
    hexes.dedup();
    assert_eq!(hexes.len(), 6);
    let analysis = analyze(&palette).unwrap_or_else(|| panic!("empty palette"));
    assert!(analysis.is_grayscale);
}

#[rstest]
fn combined_draws_from_peers(sweep: PixelBuffer) {
    let palette = extract_ok(&sweep, AlgorithmId::Combined, &seeded(6));

    // forks are taken in peer order from a context seeded like extract_with's
    let mut ctx = ExtractContext::seeded(SEED);
    let mut peers: Vec<Color> = Vec::new();
    for id in AlgorithmId::PEERS {
        let mut fork = ctx.fork();
        if let Ok(colors) = raw_candidates(&sweep, id, &mut fork) {
            peers.extend(colors);
        }
    }

    for entry in palette.entries() {
        let near = |c: &Color| {
            let d = |a: u8, b: u8| (i16::from(a) - i16::from(b)).abs();
            d(c.red, entry.color.red) <= 30 && d(c.green, entry.color.green) <= 30 && d(c.blue, entry.color.blue) <= 30
        };
        if entry.synthesized {
            assert!(peers.iter().any(near), "{} not derived from a peer", to_hex(entry.color));
        } else {
            assert!(peers.contains(&entry.color), "{} not produced by a peer", to_hex(entry.color));
        }
    }
}

#[rstest]
fn transparent_image_is_an_empty_palette(
    #[values(AlgorithmId::Average, AlgorithmId::KMeans, AlgorithmId::Perceptual, AlgorithmId::Combined)]
    algorithm: AlgorithmId,
) {
    let clear = buffer_from_fn(8, 8, |_, _| [200, 10, 10, 100]);
    match extract_with(&clear, algorithm, &seeded(6)) {
        Err(PaletteError::EmptyPalette { algorithm: reported }) => assert_eq!(reported, algorithm),
        other => panic!("expected EmptyPalette, got {other:?}"),
    }
}

#[rstest]
fn cancelled_clustering_falls_back(sweep: PixelBuffer) {
    let cancel = CancelToken::new();
    cancel.cancel();
    let options = seeded(6).with_cancel(cancel);
    for algorithm in [AlgorithmId::KMeans, AlgorithmId::Perceptual, AlgorithmId::Combined] {
        let palette = extract_ok(&sweep, algorithm, &options);
        assert_eq!(palette.len(), 6, "{algorithm}");
    }
}

#[test]
fn zero_target_count_is_rejected() {
    let buffer = PixelBuffer::filled(4, 4, Srgb::new(10, 120, 200));
    assert!(matches!(
        extract(&buffer, AlgorithmId::Octree, 0),
        Err(PaletteError::InvalidTargetCount(0))
    ));
}

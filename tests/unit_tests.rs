// tests/unit_tests.rs
use image::Rgba;
use landcover_change::error::AnalysisError;
use landcover_change::grid::{Grid, ValidityMask};
use landcover_change::processing::change::{change_raster, signed_changes, NOT_COMPARABLE, NO_CHANGE};
use landcover_change::processing::classify::{
    category_code, classify, CategoryGrid, LandCover, ThresholdContext,
};
use landcover_change::processing::indices::{IndexCalculator, IndexGrid, IndexSample, NDI};
use landcover_change::processing::stats::{area_statistics, CategoryChanges};

/// Helper function to build a uniform band of the given size
fn uniform_band(width: usize, height: usize, value: u16) -> Grid<u16> {
    Grid::filled((width, height), value)
}

fn index_grid(width: usize, height: usize, values: &[f32]) -> IndexGrid {
    Grid::new(
        (width, height),
        values.iter().map(|&v| IndexSample::Valid(v)).collect(),
    )
    .unwrap()
}

fn categories(width: usize, height: usize, classes: &[Option<LandCover>]) -> CategoryGrid {
    Grid::new((width, height), classes.to_vec()).unwrap()
}

/// Test NDVI calculation with known values
#[test]
fn test_ndvi_calculation() {
    // Test data pairs (NIR, RED)
    let cases = [
        (3000u16, 1000u16, 0.5f32),
        (1000, 3000, -0.5),
        (2000, 2000, 0.0),
        (5000, 0, 1.0),
        (0, 5000, -1.0),
    ];
    let nir = Grid::new((5, 1), cases.iter().map(|c| c.0).collect()).unwrap();
    let red = Grid::new((5, 1), cases.iter().map(|c| c.1).collect()).unwrap();

    let obs = NDI::ndvi()
        .calculate(&[&nir, &red], &ValidityMask::all_valid((5, 1)))
        .unwrap();

    for (i, (_, _, expected)) in cases.iter().enumerate() {
        let value = obs.index.to_vec()[i].value().unwrap();
        assert!(
            (value - expected).abs() < 1e-6,
            "pixel {i}: expected {expected}, got {value}"
        );
    }
    assert_eq!(obs.mask.valid_count(), 5);
}

/// Zero denominators and masked pixels produce no index value
#[test]
fn test_ndvi_invalid_pixels() {
    let nir = Grid::new((3, 1), vec![0u16, 3000, 3000]).unwrap();
    let red = Grid::new((3, 1), vec![0u16, 1000, 1000]).unwrap();
    let mask = ValidityMask::from_flags((3, 1), &[1, 1, 0]).unwrap();

    let obs = NDI::ndvi().calculate(&[&nir, &red], &mask).unwrap();

    let samples = obs.index.to_vec();
    assert_eq!(samples[0], IndexSample::Invalid);
    assert!(samples[1].is_valid());
    assert_eq!(samples[2], IndexSample::Invalid);
    // The returned mask agrees with the samples
    assert_eq!(obs.mask.to_vec(), vec![false, true, false]);
    assert_eq!(samples[2].to_nodata_f32(), IndexSample::NODATA);
    // Only the caller's mask counts as cloud or no-data
    assert_eq!(obs.clear.to_vec(), vec![true, true, false]);
}

#[test]
fn test_ndvi_shape_mismatch() {
    let nir = uniform_band(2, 2, 3000);
    let red = uniform_band(4, 1, 1000);
    let err = NDI::ndvi()
        .calculate(&[&nir, &red], &ValidityMask::all_valid((2, 2)))
        .unwrap_err();
    assert!(matches!(err, AnalysisError::ShapeMismatch { .. }));
}

#[test]
fn test_ndvi_missing_band() {
    let nir = uniform_band(2, 2, 3000);
    let err = NDI::ndvi()
        .calculate(&[&nir], &ValidityMask::all_valid((2, 2)))
        .unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::MissingBands {
            required: 2,
            provided: 1
        }
    ));
}

#[test]
fn test_mask_flags_rejected() {
    let err = ValidityMask::from_flags((2, 1), &[1, 2]).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::InvalidMaskFlag { index: 1, value: 2 }
    ));
    assert!(Grid::new((2, 2), vec![0u16; 3]).is_err());
}

/// Bin edges are inclusive below and exclusive above
#[test]
fn test_classification_boundaries() {
    let context = ThresholdContext::Urban;
    let cases = [
        (-0.5, LandCover::Water),
        (-0.1001, LandCover::Water),
        (-0.1, LandCover::BareUrban),
        (0.1999, LandCover::BareUrban),
        (0.2, LandCover::SparseVegetation),
        (0.35, LandCover::ModerateVegetation),
        (0.4999, LandCover::ModerateVegetation),
        (0.5, LandCover::DenseVegetation),
        (1.0, LandCover::DenseVegetation),
    ];
    for (value, expected) in cases {
        assert_eq!(context.classify_value(value), expected, "value {value}");
    }
}

#[test]
fn test_classification_is_monotonic() {
    let context = ThresholdContext::Urban;
    let mut previous = context.classify_value(-1.0);
    for step in 1..=2000 {
        let value = -1.0 + step as f32 * 0.001;
        let class = context.classify_value(value);
        assert!(class >= previous, "class dropped at {value}");
        previous = class;
    }
    assert_eq!(previous, LandCover::DenseVegetation);
}

#[test]
fn test_classify_respects_mask() {
    let index = index_grid(2, 2, &[0.6, 0.6, -0.3, 0.25]);
    let mask = ValidityMask::from_flags((2, 2), &[1, 0, 1, 1]).unwrap();

    let classes = classify(&index, Some(&mask), ThresholdContext::Urban).unwrap();

    assert_eq!(
        classes.to_vec(),
        vec![
            Some(LandCover::DenseVegetation),
            None,
            Some(LandCover::Water),
            Some(LandCover::SparseVegetation),
        ]
    );
    let codes: Vec<i8> = classes.iter().map(|&c| category_code(c)).collect();
    assert_eq!(codes, vec![4, -1, 0, 2]);
}

#[test]
fn test_classify_without_mask_skips_invalid_samples() {
    let index = Grid::new((2, 1), vec![IndexSample::Valid(0.1), IndexSample::Invalid]).unwrap();
    let classes = classify(&index, None, ThresholdContext::Urban).unwrap();
    assert_eq!(classes.to_vec(), vec![Some(LandCover::BareUrban), None]);
}

#[test]
fn test_unknown_context_fails() {
    assert_eq!(
        "URBAN".parse::<ThresholdContext>().unwrap(),
        ThresholdContext::Urban
    );
    assert!("forest".parse::<ThresholdContext>().is_err());
}

#[test]
fn test_area_statistics() {
    let classes = categories(
        2,
        2,
        &[
            Some(LandCover::Water),
            Some(LandCover::DenseVegetation),
            Some(LandCover::DenseVegetation),
            None,
        ],
    );
    let mask = ValidityMask::from_flags((2, 2), &[1, 1, 1, 0]).unwrap();

    let stats = area_statistics(&classes, Some(&mask)).unwrap().unwrap();

    assert_eq!(stats.valid_pixels, 3);
    assert!((stats.water - 100.0 / 3.0).abs() < 1e-9);
    assert!((stats.dense_veg - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(stats.bare_urban, 0.0);
    assert!((stats.cloud_masked - 25.0).abs() < 1e-9);

    let total: f64 = LandCover::ALL.iter().map(|&c| stats.percentage(c)).sum();
    assert!((total - 100.0).abs() < 1e-9);
}

#[test]
fn test_area_statistics_without_valid_pixels() {
    let classes = categories(2, 1, &[Some(LandCover::Water), Some(LandCover::Water)]);
    let mask = ValidityMask::from_flags((2, 1), &[0, 0]).unwrap();
    assert!(area_statistics(&classes, Some(&mask)).unwrap().is_none());
}

#[test]
fn test_category_changes() {
    let before = categories(2, 1, &[Some(LandCover::DenseVegetation); 2]);
    let after = categories(
        2,
        1,
        &[Some(LandCover::DenseVegetation), Some(LandCover::BareUrban)],
    );
    let b = area_statistics(&before, None).unwrap().unwrap();
    let a = area_statistics(&after, None).unwrap().unwrap();

    let changes = CategoryChanges::between(&b, &a);
    assert!((changes.dense_veg + 50.0).abs() < 1e-9);
    assert!((changes.bare_urban - 50.0).abs() < 1e-9);
    assert_eq!(changes.water, 0.0);
}

/// Four water pixels turning moderately vegetated in a 4x4 scene
#[test]
fn test_change_raster_gain() {
    let before = categories(4, 4, &[Some(LandCover::Water); 16]);
    let mut later = vec![Some(LandCover::Water); 16];
    for pixel in later.iter_mut().take(4) {
        *pixel = Some(LandCover::ModerateVegetation);
    }
    let after = categories(4, 4, &later);

    let raster = change_raster(&before, &after, None).unwrap();

    assert_eq!(raster.dimensions(), (4, 4));
    let gains = raster
        .pixels()
        .filter(|&&p| p == Rgba([0, 220, 0, 255]))
        .count();
    let unchanged = raster.pixels().filter(|&&p| p == NO_CHANGE).count();
    assert_eq!(gains, 4);
    assert_eq!(unchanged, 12);
}

/// Bare/urban turning densely vegetated spans three classes
#[test]
fn test_change_raster_bare_to_dense() {
    let before = categories(4, 4, &[Some(LandCover::BareUrban); 16]);
    let mut later = vec![Some(LandCover::BareUrban); 16];
    for pixel in later.iter_mut().skip(12) {
        *pixel = Some(LandCover::DenseVegetation);
    }
    let after = categories(4, 4, &later);

    let raster = change_raster(&before, &after, None).unwrap();

    for x in 0..4 {
        assert_eq!(*raster.get_pixel(x, 3), Rgba([0, 220, 0, 255]));
    }
    let unchanged = raster.pixels().filter(|&&p| p == NO_CHANGE).count();
    assert_eq!(unchanged, 12);

    let changes = signed_changes(&before, &after, None).unwrap();
    assert_eq!(changes.iter().filter(|&&c| c == Some(3)).count(), 4);
}

#[test]
fn test_change_raster_loss_and_masking() {
    let before = categories(
        3,
        1,
        &[
            Some(LandCover::DenseVegetation),
            Some(LandCover::SparseVegetation),
            Some(LandCover::Water),
        ],
    );
    let after = categories(
        3,
        1,
        &[
            Some(LandCover::Water),
            Some(LandCover::BareUrban),
            Some(LandCover::DenseVegetation),
        ],
    );
    let before_mask = ValidityMask::all_valid((3, 1));
    let after_mask = ValidityMask::from_flags((3, 1), &[1, 1, 0]).unwrap();

    let raster = change_raster(&before, &after, Some((&before_mask, &after_mask))).unwrap();

    // 4 classes down saturates at 255
    assert_eq!(*raster.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    assert_eq!(*raster.get_pixel(1, 0), Rgba([140, 0, 0, 255]));
    assert_eq!(*raster.get_pixel(2, 0), NOT_COMPARABLE);

    let changes = signed_changes(&before, &after, Some((&before_mask, &after_mask))).unwrap();
    assert_eq!(changes.to_vec(), vec![Some(-4), Some(-1), None]);
}

#[test]
fn test_change_raster_shape_mismatch() {
    let before = categories(2, 2, &[Some(LandCover::Water); 4]);
    let after = categories(4, 1, &[Some(LandCover::Water); 4]);
    assert!(matches!(
        change_raster(&before, &after, None),
        Err(AnalysisError::ShapeMismatch { .. })
    ));
}

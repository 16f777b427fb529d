// tests/pipeline_tests.rs
use image::Rgba;
use landcover_change::batch::{run_batch, BatchConfig};
use landcover_change::config::{AnalysisConfig, BoundingBox};
use landcover_change::error::{AnalysisError, FetchError};
use landcover_change::grid::{Grid, ValidityMask};
use landcover_change::io::export::{BUNDLE_FILE, CHANGE_IMAGE, CHART_IMAGE};
use landcover_change::io::{
    export_bundle, load_observation, Epoch, FileSceneSource, InMemorySource, SceneFile,
};
use landcover_change::processing::change::{NOT_COMPARABLE, NO_CHANGE};
use landcover_change::processing::correlation::{Direction, NotComputedReason, Strength};
use landcover_change::processing::indices::{IndexCalculator, Observation, NDI};
use landcover_change::processing::pipeline::{AnalysisPipeline, Trend};
use landcover_change::processing::CorrelationOutcome;
use tempfile::tempdir;

/// Observation from uniform or per-pixel NIR/red values
fn observation(width: usize, height: usize, nir: Vec<u16>, red: Vec<u16>) -> Observation {
    let nir = Grid::new((width, height), nir).unwrap();
    let red = Grid::new((width, height), red).unwrap();
    NDI::ndvi()
        .calculate(&[&nir, &red], &ValidityMask::all_valid((width, height)))
        .unwrap()
}

fn uniform(width: usize, height: usize, nir: u16, red: u16) -> Observation {
    observation(width, height, vec![nir; width * height], vec![red; width * height])
}

fn seeded_pipeline() -> AnalysisPipeline {
    AnalysisPipeline::new(AnalysisConfig {
        seed: Some(7),
        ..AnalysisConfig::default()
    })
    .unwrap()
}

fn scene_file(width: usize, height: usize, nir: u16, red: u16) -> SceneFile {
    SceneFile {
        width,
        height,
        red: vec![red; width * height],
        nir: vec![nir; width * height],
        mask: None,
        scl: None,
    }
}

/// 4x4 scene with NDVI 0.5 everywhere on both dates
#[test]
fn test_uniform_dense_vegetation() {
    let obs = uniform(4, 4, 3000, 1000);
    let source = InMemorySource::new(obs.clone(), obs);

    let bundle = seeded_pipeline().run(&source, None).unwrap();

    let before = bundle.before.statistics.unwrap();
    assert_eq!(before.dense_veg, 100.0);
    assert_eq!(before.valid_pixels, 16);
    assert_eq!(before.cloud_masked, 0.0);
    assert_eq!(bundle.before.year, 2018);
    assert_eq!(bundle.after.year, 2024);

    let changes = bundle.changes.unwrap();
    assert_eq!(changes.dense_veg, 0.0);
    let summary = bundle.summary.unwrap();
    assert_eq!(summary.overall_trend, Trend::Stable);
    assert_eq!(summary.resolution_m, None);

    assert!(bundle.change_raster.pixels().all(|&p| p == NO_CHANGE));
    assert_eq!(
        bundle.correlation,
        CorrelationOutcome::NotComputed {
            reason: NotComputedReason::ConstantInput,
            samples: 16,
        }
    );
    assert!(bundle.chart.is_none());
}

#[test]
fn test_urban_expansion() {
    let (width, height) = (8, 8);
    let before = uniform(width, height, 3000, 1000);
    // First two rows turn bare/urban
    let nir = (0..width * height)
        .map(|i| if i < 16 { 1100 } else { 3000 })
        .collect();
    let after = observation(width, height, nir, vec![1000; width * height]);
    let bbox = BoundingBox::new(0.0, 0.0, 1.0, 0.008).unwrap();

    let bundle = seeded_pipeline()
        .analyze(&before, &after, Some(&bbox))
        .unwrap();

    let summary = bundle.summary.as_ref().unwrap();
    assert_eq!(summary.urban_increase, 25.0);
    assert_eq!(summary.vegetation_increase, -25.0);
    assert_eq!(summary.overall_trend, Trend::VegetationLoss);
    assert_eq!(summary.resolution_m, Some(111.0));

    // Dense to bare/urban spans three classes
    assert_eq!(*bundle.change_raster.get_pixel(0, 0), Rgba([220, 0, 0, 255]));
    assert_eq!(*bundle.change_raster.get_pixel(0, 7), NO_CHANGE);

    let report = bundle.correlation.report().unwrap();
    assert_eq!(report.correlation.direction, Direction::Negative);
    assert_eq!(report.correlation.strength, Strength::Strong);
    assert_eq!(report.summary.pixels_with_urban_gain, 16);
    assert!(report.summary.mean_ndvi_change_urban < -0.4);

    let chart = bundle.chart.as_ref().unwrap();
    assert_eq!(chart.sampled_points, 64);

    // Same seed, same chart
    let again = seeded_pipeline()
        .analyze(&before, &after, Some(&bbox))
        .unwrap();
    assert_eq!(
        chart.image.as_raw(),
        again.chart.as_ref().unwrap().image.as_raw()
    );
}

#[test]
fn test_chart_can_be_disabled() {
    let before = uniform(8, 8, 3000, 1000);
    let nir = (0..64).map(|i| if i % 4 == 0 { 1100 } else { 3000 }).collect();
    let after = observation(8, 8, nir, vec![1000; 64]);
    let pipeline = AnalysisPipeline::new(AnalysisConfig {
        render_chart: false,
        ..AnalysisConfig::default()
    })
    .unwrap();

    let bundle = pipeline.analyze(&before, &after, None).unwrap();
    assert!(bundle.correlation.is_computed());
    assert!(bundle.chart.is_none());
}

#[test]
fn test_fetch_failure_is_reported() {
    let obs = uniform(2, 2, 3000, 1000);
    let source = InMemorySource::with_results(Err(FetchError::new("quota exceeded")), Ok(obs));

    let err = seeded_pipeline().run(&source, None).unwrap_err();

    assert!(matches!(
        err,
        AnalysisError::Fetch {
            epoch: Epoch::Before,
            year: 2018,
            ..
        }
    ));
    assert_eq!(err.to_string(), "2018 data failed: quota exceeded");
}

#[test]
fn test_fully_masked_date() {
    let before = uniform(3, 3, 3000, 1000);
    // Zero reflectance leaves no computable pixel
    let after = uniform(3, 3, 0, 0);

    let bundle = seeded_pipeline().analyze(&before, &after, None).unwrap();

    assert!(bundle.before.statistics.is_some());
    assert!(bundle.after.statistics.is_none());
    assert!(bundle.changes.is_none());
    assert!(bundle.summary.is_none());
    assert!(bundle.change_raster.pixels().all(|&p| p == NOT_COMPARABLE));
    assert_eq!(
        bundle.correlation,
        CorrelationOutcome::NotComputed {
            reason: NotComputedReason::InsufficientSamples,
            samples: 0,
        }
    );
}

#[test]
fn test_shape_mismatch_between_dates() {
    let before = uniform(2, 2, 3000, 1000);
    let after = uniform(4, 1, 3000, 1000);
    assert!(matches!(
        seeded_pipeline().analyze(&before, &after, None),
        Err(AnalysisError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_scene_file_masks_clouds() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scene.json");
    let scene = SceneFile {
        mask: Some(vec![1, 1, 1, 0]),
        scl: Some(vec![4, 9, 5, 4]),
        ..scene_file(2, 2, 3000, 1000)
    };
    std::fs::write(&path, serde_json::to_string(&scene).unwrap()).unwrap();

    let obs = load_observation(&path).unwrap();

    assert_eq!(obs.mask.to_vec(), vec![true, false, true, false]);
    assert_eq!(obs.index.iter().filter(|s| s.is_valid()).count(), 2);
}

/// A clear pixel with no computable index is not counted as cloud
#[test]
fn test_cloud_share_ignores_zero_denominator() {
    let mut nir = vec![3000u16; 16];
    let mut red = vec![1000u16; 16];
    nir[5] = 0;
    red[5] = 0;
    let before = observation(4, 4, nir, red);
    let after = uniform(4, 4, 3000, 1000);

    let bundle = seeded_pipeline().analyze(&before, &after, None).unwrap();

    let stats = bundle.before.statistics.unwrap();
    assert_eq!(stats.valid_pixels, 15);
    assert_eq!(stats.cloud_masked, 0.0);
    assert_eq!(*bundle.change_raster.get_pixel(1, 1), NOT_COMPARABLE);
}

#[test]
fn test_oversized_renderer_margin_is_rejected() {
    let config: AnalysisConfig =
        serde_json::from_str(r#"{"renderer": {"margin": 2147483648}}"#).unwrap();
    assert!(matches!(
        AnalysisPipeline::new(config),
        Err(AnalysisError::Config(_))
    ));
}

#[test]
fn test_missing_scene_file_is_fetch_error() {
    let dir = tempdir().unwrap();
    let source = FileSceneSource::new(dir.path().join("missing.json"), dir.path().join("b.json"));
    let err = seeded_pipeline().run(&source, None).unwrap_err();
    assert!(err.to_string().starts_with("2018 data failed:"));
}

#[test]
fn test_export_bundle() {
    let dir = tempdir().unwrap();
    let before_path = dir.path().join("before.json");
    let after_path = dir.path().join("after.json");
    std::fs::write(
        &before_path,
        serde_json::to_string(&scene_file(4, 4, 3000, 1000)).unwrap(),
    )
    .unwrap();
    std::fs::write(
        &after_path,
        serde_json::to_string(&scene_file(4, 4, 3000, 1000)).unwrap(),
    )
    .unwrap();

    let source = FileSceneSource::new(&before_path, &after_path);
    let bundle = seeded_pipeline().run(&source, None).unwrap();
    let out = dir.path().join("out");
    let written = export_bundle(&bundle, &out).unwrap();

    assert_eq!(written.len(), 4);
    for name in [
        BUNDLE_FILE,
        CHANGE_IMAGE,
        "classification_before.png",
        "classification_after.png",
    ] {
        assert!(out.join(name).exists(), "{name} missing");
    }
    assert!(!out.join(CHART_IMAGE).exists());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join(BUNDLE_FILE)).unwrap()).unwrap();
    assert_eq!(json["context"], "urban");
    assert_eq!(json["correlation"]["status"], "not_computed");
    assert_eq!(json["before"]["statistics"]["dense_veg"], 100.0);
    assert_eq!(json["summary"]["overall_trend"], "Stable");
}

#[test]
fn test_batch_records_failures() {
    let dir = tempdir().unwrap();
    let scene_path = dir.path().join("scene.json");
    std::fs::write(
        &scene_path,
        serde_json::to_string(&scene_file(4, 4, 3000, 1000)).unwrap(),
    )
    .unwrap();

    let config: BatchConfig = serde_json::from_value(serde_json::json!({
        "global": { "seed": 1 },
        "operations": [
            {
                "name": "ok",
                "before": scene_path,
                "after": scene_path,
                "output": dir.path().join("ok"),
            },
            {
                "name": "broken",
                "before": dir.path().join("nope.json"),
                "after": scene_path,
                "output": dir.path().join("broken"),
            }
        ]
    }))
    .unwrap();

    let report = run_batch(&config, Some(2)).unwrap();

    assert_eq!(report.succeeded, vec!["ok".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "broken");
    assert!(!report.is_success());
    assert!(dir.path().join("ok").join(BUNDLE_FILE).exists());
}

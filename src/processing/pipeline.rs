// src/processing/pipeline.rs
//! Two-date analysis entry point.
//!
//! Order of work: fetch both dates, classify each, per-date statistics,
//! change raster, correlation, and optionally the diagnostic chart.

use image::{RgbImage, RgbaImage};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{AnalysisConfig, BoundingBox};
use crate::error::{AnalysisError, Result};
use crate::io::{Epoch, SceneSource};
use crate::processing::change::change_raster;
use crate::processing::classify::{classify, CategoryGrid, ThresholdContext};
use crate::processing::correlation::{analyze_correlation, CorrelationInputs, CorrelationOutcome};
use crate::processing::indices::Observation;
use crate::processing::stats::{area_statistics, AreaStatistics, CategoryChanges};
use crate::render::{classification_map, DiagnosticChart, DiagnosticRenderer};

/// Results for one acquisition date.
#[derive(Debug, Clone, Serialize)]
pub struct DateResult {
    pub year: u16,
    /// `None` when the date has no valid pixel.
    pub statistics: Option<AreaStatistics>,
    #[serde(skip)]
    pub categories: CategoryGrid,
    #[serde(skip)]
    pub classification: RgbImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    #[serde(rename = "Vegetation growth")]
    VegetationGrowth,
    #[serde(rename = "Vegetation loss")]
    VegetationLoss,
    #[serde(rename = "Stable")]
    Stable,
}

/// Headline numbers of the change between the two dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Percentage-point change of moderate plus dense vegetation.
    pub vegetation_increase: f64,
    pub urban_increase: f64,
    pub overall_trend: Trend,
    pub resolution_m: Option<f64>,
}

impl ChangeSummary {
    pub fn new(
        before: &AreaStatistics,
        after: &AreaStatistics,
        changes: &CategoryChanges,
        resolution_m: Option<f64>,
    ) -> Self {
        let vegetation = after.vegetated() - before.vegetated();
        let overall_trend = if vegetation > 0.0 {
            Trend::VegetationGrowth
        } else if vegetation < 0.0 {
            Trend::VegetationLoss
        } else {
            Trend::Stable
        };
        Self {
            vegetation_increase: round2(vegetation),
            urban_increase: round2(changes.bare_urban),
            overall_trend,
            resolution_m: resolution_m.map(|r| (r * 10.0).round() / 10.0),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Everything one analysis produces.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisBundle {
    pub context: ThresholdContext,
    pub before: DateResult,
    pub after: DateResult,
    /// `None` when either date has no statistics.
    pub changes: Option<CategoryChanges>,
    pub summary: Option<ChangeSummary>,
    #[serde(skip)]
    pub change_raster: RgbaImage,
    pub correlation: CorrelationOutcome,
    pub chart: Option<DiagnosticChart>,
}

pub struct AnalysisPipeline {
    config: AnalysisConfig,
    renderer: DiagnosticRenderer,
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let renderer = DiagnosticRenderer::new(config.renderer.clone())?;
        Ok(Self { config, renderer })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Fetch both dates from `source` and analyze them.
    ///
    /// A fetch failure on either date aborts before any classification.
    pub fn run(
        &self,
        source: &dyn SceneSource,
        bbox: Option<&BoundingBox>,
    ) -> Result<AnalysisBundle> {
        let before = self.fetch(source, Epoch::Before)?;
        let after = self.fetch(source, Epoch::After)?;
        self.analyze(&before, &after, bbox)
    }

    fn fetch(&self, source: &dyn SceneSource, epoch: Epoch) -> Result<Observation> {
        let year = self.config.years.year(epoch);
        source.fetch(epoch).map_err(|reason| {
            warn!(%epoch, year, %reason, "scene fetch failed");
            AnalysisError::Fetch {
                epoch,
                year,
                source: reason,
            }
        })
    }

    /// Analyze two observations with the configured random source.
    pub fn analyze(
        &self,
        before: &Observation,
        after: &Observation,
        bbox: Option<&BoundingBox>,
    ) -> Result<AnalysisBundle> {
        let mut rng = self.config.rng();
        self.analyze_with_rng(before, after, bbox, &mut rng)
    }

    pub fn analyze_with_rng<R: Rng + ?Sized>(
        &self,
        before: &Observation,
        after: &Observation,
        bbox: Option<&BoundingBox>,
        rng: &mut R,
    ) -> Result<AnalysisBundle> {
        before.index.ensure_same_shape(&before.mask, "earlier mask")?;
        before.index.ensure_same_shape(&after.index, "later index grid")?;
        before.index.ensure_same_shape(&after.mask, "later mask")?;

        let context = self.config.context;
        let (width, height) = before.shape();
        info!(width, height, %context, "starting land-cover change analysis");

        let before_result = self.date_result(Epoch::Before, before)?;
        let after_result = self.date_result(Epoch::After, after)?;

        let changes = match (&before_result.statistics, &after_result.statistics) {
            (Some(b), Some(a)) => Some(CategoryChanges::between(b, a)),
            _ => {
                warn!("statistics unavailable for at least one date, skipping class changes");
                None
            }
        };
        let resolution_m = bbox.and_then(|b| b.approx_resolution_m(height));
        let summary = match (&before_result.statistics, &after_result.statistics, &changes) {
            (Some(b), Some(a), Some(c)) => Some(ChangeSummary::new(b, a, c, resolution_m)),
            _ => None,
        };

        let masks = Some((&before.mask, &after.mask));
        let change = change_raster(&before_result.categories, &after_result.categories, masks)?;

        let (samples, correlation) = analyze_correlation(&CorrelationInputs {
            before_index: &before.index,
            after_index: &after.index,
            before_classes: &before_result.categories,
            after_classes: &after_result.categories,
            masks,
        })?;

        let chart = match correlation.report() {
            Some(report) if self.config.render_chart => {
                Some(self.renderer.render(&samples, report, rng))
            }
            Some(_) => None,
            None => {
                info!(samples = samples.len(), "correlation not computed");
                None
            }
        };

        if let Some(report) = correlation.report() {
            info!(
                r = report.correlation.r,
                p_value = report.correlation.p_value,
                samples = samples.len(),
                "correlation computed"
            );
        }

        Ok(AnalysisBundle {
            context,
            before: before_result,
            after: after_result,
            changes,
            summary,
            change_raster: change,
            correlation,
            chart,
        })
    }

    fn date_result(&self, epoch: Epoch, observation: &Observation) -> Result<DateResult> {
        let categories = classify(&observation.index, Some(&observation.mask), self.config.context)?;
        observation.mask.ensure_same_shape(&observation.clear, "cloud mask")?;
        let statistics = area_statistics(&categories, Some(&observation.mask))?
            .map(|stats| stats.with_cloud_cover(&observation.clear));
        match &statistics {
            Some(stats) => debug!(
                %epoch,
                valid = stats.valid_pixels,
                cloud_masked = stats.cloud_masked,
                "classified"
            ),
            None => warn!(%epoch, "no valid pixels"),
        }
        Ok(DateResult {
            year: self.config.years.year(epoch),
            statistics,
            classification: classification_map(&categories)?,
            categories,
        })
    }
}

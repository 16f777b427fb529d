// src/processing/correlation.rs
//! Association between urban gain and NDVI change.
//!
//! Each comparably valid pixel yields one sample: a binary indicator of
//! whether it turned bare/urban between the dates, and its index change.
//! Pearson correlation and an ordinary least-squares regression are computed
//! independently over those samples. Rendering lives in
//! [`crate::render::chart`]; nothing here is random.

use ndarray::Zip;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::Result;
use crate::processing::change::{check_mask_pair, MaskPair};
use crate::processing::classify::{CategoryGrid, LandCover};
use crate::processing::indices::{IndexGrid, IndexSample};

/// Smallest sample count for which statistics are reported.
pub const MIN_SAMPLES: usize = 11;
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;
/// Class whose gain is tested.
pub const URBAN_CLASS: LandCover = LandCover::BareUrban;

/// Grids of both dates feeding the correlation step.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationInputs<'a> {
    pub before_index: &'a IndexGrid,
    pub after_index: &'a IndexGrid,
    pub before_classes: &'a CategoryGrid,
    pub after_classes: &'a CategoryGrid,
    pub masks: MaskPair<'a>,
}

/// Flattened `(urban_gain, index_change)` pairs in pixel order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSamples {
    pub urban_gain: Vec<u8>,
    pub index_change: Vec<f64>,
}

impl ChangeSamples {
    pub fn collect(inputs: &CorrelationInputs<'_>) -> Result<Self> {
        let reference = inputs.before_index;
        reference.ensure_same_shape(inputs.after_index, "later index grid")?;
        reference.ensure_same_shape(inputs.before_classes, "earlier category grid")?;
        reference.ensure_same_shape(inputs.after_classes, "later category grid")?;
        check_mask_pair(inputs.before_classes, inputs.masks)?;

        let mut samples = ChangeSamples::default();
        let mut push = |before: &IndexSample,
                        after: &IndexSample,
                        class_before: &Option<LandCover>,
                        class_after: &Option<LandCover>,
                        valid: bool| {
            let (true, Some(before), Some(after)) = (valid, before.value(), after.value()) else {
                return;
            };
            let gained = *class_before != Some(URBAN_CLASS) && *class_after == Some(URBAN_CLASS);
            samples.urban_gain.push(u8::from(gained));
            samples.index_change.push(f64::from(after) - f64::from(before));
        };

        let pixels = Zip::from(inputs.before_index.array())
            .and(inputs.after_index.array())
            .and(inputs.before_classes.array())
            .and(inputs.after_classes.array());
        match inputs.masks {
            Some((before_mask, after_mask)) => pixels
                .and(before_mask.array())
                .and(after_mask.array())
                .for_each(|b, a, cb, ca, &valid_b, &valid_a| push(b, a, cb, ca, valid_b && valid_a)),
            None => pixels.for_each(|b, a, cb, ca| push(b, a, cb, ca, true)),
        }
        Ok(samples)
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (u8, f64)>) -> Self {
        let (urban_gain, index_change) = pairs.into_iter().unzip();
        Self {
            urban_gain,
            index_change,
        }
    }

    pub fn len(&self) -> usize {
        self.index_change.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_change.is_empty()
    }

    pub fn gain_count(&self) -> usize {
        self.urban_gain.iter().filter(|&&g| g == 1).count()
    }

    fn gain_as_f64(&self) -> Vec<f64> {
        self.urban_gain.iter().map(|&g| f64::from(g)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
}

impl Strength {
    pub fn from_r(r: f64) -> Self {
        match r.abs() {
            a if a > 0.7 => Strength::Strong,
            a if a > 0.4 => Strength::Moderate,
            _ => Strength::Weak,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strength::Strong => "strong",
            Strength::Moderate => "moderate",
            Strength::Weak => "weak",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    pub fn from_r(r: f64) -> Self {
        if r > 0.0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Positive => "positive",
            Direction::Negative => "negative",
        }
    }
}

/// Pearson coefficient with its two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PearsonFit {
    pub r: f64,
    pub p_value: f64,
}

/// Simple linear regression `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
    pub p_value: f64,
    pub std_error: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

struct Moments {
    n: f64,
    mean_x: f64,
    mean_y: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

fn moments(x: &[f64], y: &[f64]) -> Option<Moments> {
    if x.len() != y.len() || x.len() < 3 {
        return None;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    Some(Moments {
        n,
        mean_x,
        mean_y,
        sxx,
        syy,
        sxy,
    })
}

/// Two-sided tail probability of `t` under Student's t with `df` degrees of freedom.
fn two_sided_p(t: f64, df: f64) -> Option<f64> {
    if t.is_infinite() {
        return Some(0.0);
    }
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

/// Pearson correlation. `None` when fewer than 3 pairs or either variable is
/// constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<PearsonFit> {
    let m = moments(x, y)?;
    if m.sxx <= 0.0 || m.syy <= 0.0 {
        return None;
    }
    let r = (m.sxy / (m.sxx * m.syy).sqrt()).clamp(-1.0, 1.0);
    let df = m.n - 2.0;
    let unexplained = 1.0 - r * r;
    let p_value = if unexplained <= 0.0 {
        0.0
    } else {
        two_sided_p(r * (df / unexplained).sqrt(), df)?
    };
    Some(PearsonFit { r, p_value })
}

/// Ordinary least squares of `y` on `x`. `None` when fewer than 3 pairs or `x`
/// is constant.
///
/// The p-value tests a zero slope using the residual standard error, so it is
/// derived without going through [`pearson`].
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let m = moments(x, y)?;
    if m.sxx <= 0.0 {
        return None;
    }
    let slope = m.sxy / m.sxx;
    let intercept = m.mean_y - slope * m.mean_x;
    let r = if m.syy > 0.0 {
        (m.sxy / (m.sxx * m.syy).sqrt()).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    let df = m.n - 2.0;
    let sse: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| {
            let residual = yi - (slope * xi + intercept);
            residual * residual
        })
        .sum();
    let std_error = (sse / df / m.sxx).sqrt();
    let p_value = if std_error > 0.0 {
        two_sided_p(slope / std_error, df)?
    } else if slope == 0.0 {
        1.0
    } else {
        0.0
    };

    Some(LinearFit {
        slope,
        intercept,
        r,
        p_value,
        std_error,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSection {
    pub r: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub significant: bool,
    pub strength: Strength,
    pub direction: Direction,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionSection {
    pub coefficient: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub std_error: f64,
    pub equation: String,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub total_valid_pixels: usize,
    pub pixels_with_urban_gain: usize,
    pub urban_gain_percentage: f64,
    pub mean_ndvi_change_all: f64,
    pub mean_ndvi_change_urban: f64,
    pub mean_ndvi_change_non_urban: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

impl SampleSummary {
    pub fn from_samples(samples: &ChangeSamples) -> Self {
        let total = samples.len();
        let gained = samples.gain_count();
        let pairs = || samples.urban_gain.iter().zip(&samples.index_change);

        Self {
            total_valid_pixels: total,
            pixels_with_urban_gain: gained,
            urban_gain_percentage: if total == 0 {
                0.0
            } else {
                gained as f64 / total as f64 * 100.0
            },
            mean_ndvi_change_all: mean(samples.index_change.iter().copied()),
            mean_ndvi_change_urban: mean(pairs().filter(|(g, _)| **g == 1).map(|(_, c)| *c)),
            mean_ndvi_change_non_urban: mean(pairs().filter(|(g, _)| **g == 0).map(|(_, c)| *c)),
        }
    }
}

/// Statistics reported when the correlation could be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub correlation: CorrelationSection,
    pub regression: RegressionSection,
    pub summary: SampleSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotComputedReason {
    /// Fewer than [`MIN_SAMPLES`] comparably valid pixels.
    InsufficientSamples,
    /// Urban gain or index change does not vary, so r is undefined.
    ConstantInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CorrelationOutcome {
    Computed(CorrelationReport),
    NotComputed {
        reason: NotComputedReason,
        samples: usize,
    },
}

impl CorrelationOutcome {
    pub fn report(&self) -> Option<&CorrelationReport> {
        match self {
            CorrelationOutcome::Computed(report) => Some(report),
            CorrelationOutcome::NotComputed { .. } => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        self.report().is_some()
    }
}

/// Run both statistical tests over `samples`.
pub fn analyze(samples: &ChangeSamples) -> CorrelationOutcome {
    let n = samples.len();
    if n < MIN_SAMPLES {
        return CorrelationOutcome::NotComputed {
            reason: NotComputedReason::InsufficientSamples,
            samples: n,
        };
    }

    let x = samples.gain_as_f64();
    let y = &samples.index_change;
    let (Some(corr), Some(fit)) = (pearson(&x, y), linear_regression(&x, y)) else {
        return CorrelationOutcome::NotComputed {
            reason: NotComputedReason::ConstantInput,
            samples: n,
        };
    };

    let r_squared = corr.r * corr.r;
    let strength = Strength::from_r(corr.r);
    let direction = Direction::from_r(corr.r);

    CorrelationOutcome::Computed(CorrelationReport {
        correlation: CorrelationSection {
            r: corr.r,
            r_squared,
            p_value: corr.p_value,
            significant: corr.p_value < SIGNIFICANCE_LEVEL,
            strength,
            direction,
            interpretation: format!(
                "There is a {} {} correlation (r = {:.3}) between urban expansion and NDVI change.",
                strength.as_str(),
                direction.as_str(),
                corr.r
            ),
        },
        regression: RegressionSection {
            coefficient: fit.slope,
            intercept: fit.intercept,
            r_squared: fit.r * fit.r,
            p_value: fit.p_value,
            std_error: fit.std_error,
            equation: format!(
                "NDVI Change = {:.4} × Urban Gain + {:.4}",
                fit.slope, fit.intercept
            ),
            interpretation: format!(
                "The regression model explains {:.1}% of the variance in NDVI change.",
                r_squared * 100.0
            ),
        },
        summary: SampleSummary::from_samples(samples),
    })
}

/// Collect samples from both dates and analyze them.
pub fn analyze_correlation(
    inputs: &CorrelationInputs<'_>,
) -> Result<(ChangeSamples, CorrelationOutcome)> {
    let samples = ChangeSamples::collect(inputs)?;
    let outcome = analyze(&samples);
    Ok((samples, outcome))
}

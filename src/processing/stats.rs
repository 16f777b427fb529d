// src/processing/stats.rs
//! Per-class area statistics.

use ndarray::Zip;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::grid::ValidityMask;
use crate::processing::classify::{CategoryGrid, LandCover};

/// Share of valid pixels per class (0-100) plus the cloud-masked share of the
/// whole grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaStatistics {
    pub water: f64,
    pub bare_urban: f64,
    pub sparse_veg: f64,
    pub moderate_veg: f64,
    pub dense_veg: f64,
    pub cloud_masked: f64,
    pub valid_pixels: usize,
}

impl AreaStatistics {
    pub fn percentage(&self, class: LandCover) -> f64 {
        match class {
            LandCover::Water => self.water,
            LandCover::BareUrban => self.bare_urban,
            LandCover::SparseVegetation => self.sparse_veg,
            LandCover::ModerateVegetation => self.moderate_veg,
            LandCover::DenseVegetation => self.dense_veg,
        }
    }

    /// Moderate plus dense vegetation.
    pub fn vegetated(&self) -> f64 {
        self.moderate_veg + self.dense_veg
    }

    /// Take `cloud_masked` from the cloud and no-data mask alone, so pixels
    /// that were clear but had no computable index do not count as cloud.
    pub fn with_cloud_cover(self, clear: &ValidityMask) -> Self {
        Self {
            cloud_masked: clear.masked_share(),
            ..self
        }
    }
}

/// Compute area statistics for one date.
///
/// Returns `Ok(None)` when no pixel is valid. Class shares use the valid pixel
/// count as denominator; `cloud_masked` uses the full grid size.
pub fn area_statistics(
    categories: &CategoryGrid,
    mask: Option<&ValidityMask>,
) -> Result<Option<AreaStatistics>> {
    let mut counts = [0usize; LandCover::ALL.len()];
    let mut tally = |category: &Option<LandCover>, valid: bool| {
        if let (true, Some(class)) = (valid, category) {
            counts[class.code() as usize] += 1;
        }
    };
    match mask {
        Some(mask) => {
            categories.ensure_same_shape(mask, "validity mask")?;
            Zip::from(categories.array())
                .and(mask.array())
                .for_each(|category, &valid| tally(category, valid));
        }
        None => categories.iter().for_each(|category| tally(category, true)),
    }

    let valid: usize = counts.iter().sum();
    if valid == 0 {
        return Ok(None);
    }

    let share = |class: LandCover| counts[class.code() as usize] as f64 / valid as f64 * 100.0;
    let cloud_masked = mask.map_or(0.0, ValidityMask::masked_share);

    Ok(Some(AreaStatistics {
        water: share(LandCover::Water),
        bare_urban: share(LandCover::BareUrban),
        sparse_veg: share(LandCover::SparseVegetation),
        moderate_veg: share(LandCover::ModerateVegetation),
        dense_veg: share(LandCover::DenseVegetation),
        cloud_masked,
        valid_pixels: valid,
    }))
}

/// Percentage-point change of each class between two dates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryChanges {
    pub water: f64,
    pub bare_urban: f64,
    pub sparse_veg: f64,
    pub moderate_veg: f64,
    pub dense_veg: f64,
}

impl CategoryChanges {
    pub fn between(before: &AreaStatistics, after: &AreaStatistics) -> Self {
        let delta = |class| after.percentage(class) - before.percentage(class);
        Self {
            water: delta(LandCover::Water),
            bare_urban: delta(LandCover::BareUrban),
            sparse_veg: delta(LandCover::SparseVegetation),
            moderate_veg: delta(LandCover::ModerateVegetation),
            dense_veg: delta(LandCover::DenseVegetation),
        }
    }
}

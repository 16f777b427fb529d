// src/processing/classify.rs
//! Threshold classification of index grids into land-cover categories.

use std::fmt;
use std::str::FromStr;

use ndarray::Zip;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::grid::{Grid, ValidityMask};
use crate::processing::indices::{IndexGrid, IndexSample};

/// Land-cover classes, ordered by increasing index value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i8)]
pub enum LandCover {
    Water = 0,
    BareUrban = 1,
    SparseVegetation = 2,
    ModerateVegetation = 3,
    DenseVegetation = 4,
}

/// Category code of a masked pixel.
pub const MASKED_CODE: i8 = -1;

impl LandCover {
    pub const ALL: [LandCover; 5] = [
        LandCover::Water,
        LandCover::BareUrban,
        LandCover::SparseVegetation,
        LandCover::ModerateVegetation,
        LandCover::DenseVegetation,
    ];

    pub fn code(self) -> i8 {
        self as i8
    }
}

/// Per-pixel category; `None` marks a masked pixel.
pub type CategoryGrid = Grid<Option<LandCover>>;

/// Integer code of a category cell, `-1` when masked.
pub fn category_code(category: Option<LandCover>) -> i8 {
    category.map_or(MASKED_CODE, LandCover::code)
}

/// Named threshold table used to bin index values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ThresholdContext {
    #[default]
    Urban,
}

impl ThresholdContext {
    /// Ascending bin edges. Each bin is closed below and open above; the last
    /// bin is unbounded.
    pub fn thresholds(self) -> [f32; 4] {
        match self {
            ThresholdContext::Urban => [-0.1, 0.2, 0.35, 0.5],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ThresholdContext::Urban => "urban",
        }
    }

    pub fn classify_value(self, value: f32) -> LandCover {
        let edges = self.thresholds();
        let bin = edges
            .iter()
            .position(|&edge| value < edge)
            .unwrap_or(edges.len());
        LandCover::ALL[bin]
    }
}

impl fmt::Display for ThresholdContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ThresholdContext {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urban" => Ok(ThresholdContext::Urban),
            _ => Err(ConfigError::UnknownContext(s.to_string())),
        }
    }
}

impl TryFrom<String> for ThresholdContext {
    type Error = ConfigError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ThresholdContext> for String {
    fn from(context: ThresholdContext) -> Self {
        context.name().to_string()
    }
}

/// Classify every pixel of `index`.
///
/// Masked pixels become `None` before their index value is looked at. Without
/// a mask every pixel counts as valid, but an `Invalid` sample still cannot be
/// binned and is reported as masked.
pub fn classify(
    index: &IndexGrid,
    mask: Option<&ValidityMask>,
    context: ThresholdContext,
) -> Result<CategoryGrid> {
    let bin = |sample: &IndexSample| sample.value().map(|v| context.classify_value(v));

    let classes = match mask {
        Some(mask) => {
            index.ensure_same_shape(mask, "validity mask")?;
            Zip::from(index.array())
                .and(mask.array())
                .par_map_collect(|sample, &valid| if valid { bin(sample) } else { None })
        }
        None => Zip::from(index.array()).par_map_collect(|sample| bin(sample)),
    };

    Ok(Grid::from_array(classes))
}

// src/config.rs
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::io::Epoch;
use crate::processing::classify::ThresholdContext;
use crate::render::RendererConfig;

/// Settings for one two-date analysis.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub context: ThresholdContext,
    /// Seed for the chart subsample. Without one the chart differs between runs.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_true")]
    pub render_chart: bool,
    #[serde(default)]
    pub years: EpochYears,
    #[serde(default)]
    pub renderer: RendererConfig,
}

fn default_true() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            context: ThresholdContext::default(),
            seed: None,
            render_chart: default_true(),
            years: EpochYears::default(),
            renderer: RendererConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.renderer.validate()
    }

    /// Random source for chart sampling: seeded when a seed is configured.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Acquisition year labels of the two epochs.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochYears {
    pub before: u16,
    pub after: u16,
}

impl Default for EpochYears {
    fn default() -> Self {
        Self {
            before: 2018,
            after: 2024,
        }
    }
}

impl EpochYears {
    pub fn year(&self, epoch: Epoch) -> u16 {
        match epoch {
            Epoch::Before => self.before,
            Epoch::After => self.after,
        }
    }
}

/// Geographic extent in WGS84 degrees.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// Metres per degree of latitude, rounded.
const METRES_PER_DEGREE: f64 = 111_000.0;

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self, ConfigError> {
        let bbox = Self {
            west,
            south,
            east,
            north,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let coords = [self.west, self.south, self.east, self.north];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::InvalidBoundingBox(
                "coordinates must be finite".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.south) || !(-90.0..=90.0).contains(&self.north) {
            return Err(ConfigError::InvalidBoundingBox(
                "latitude outside [-90, 90]".to_string(),
            ));
        }
        if !(-180.0..=180.0).contains(&self.west) || !(-180.0..=180.0).contains(&self.east) {
            return Err(ConfigError::InvalidBoundingBox(
                "longitude outside [-180, 180]".to_string(),
            ));
        }
        if self.north <= self.south || self.east <= self.west {
            return Err(ConfigError::InvalidBoundingBox(format!(
                "empty extent {},{},{},{}",
                self.west, self.south, self.east, self.north
            )));
        }
        Ok(())
    }

    /// Approximate ground size of one pixel row in metres for a grid `rows` high.
    pub fn approx_resolution_m(&self, rows: usize) -> Option<f64> {
        (rows > 0).then(|| (self.north - self.south) * METRES_PER_DEGREE / rows as f64)
    }
}

impl FromStr for BoundingBox {
    type Err = ConfigError;

    /// Parses `west,south,east,north`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::InvalidBoundingBox(format!("'{s}': {e}")))?;
        match values.as_slice() {
            &[west, south, east, north] => BoundingBox::new(west, south, east, north),
            _ => Err(ConfigError::InvalidBoundingBox(format!(
                "'{s}': expected west,south,east,north"
            ))),
        }
    }
}

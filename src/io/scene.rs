// src/io/scene.rs
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FetchError, Result};
use crate::grid::{Grid, ValidityMask};
use crate::processing::indices::{IndexCalculator, Observation, NDI};
use crate::utils::mask::mask_from_scl;

/// One of the two acquisition dates of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Epoch {
    Before,
    After,
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Epoch::Before => f.write_str("before"),
            Epoch::After => f.write_str("after"),
        }
    }
}

/// Supplier of one date's index grid and validity mask.
///
/// Implementations wrap whatever fetches imagery; a failure carries the
/// reason text that the analysis reports unchanged.
pub trait SceneSource: Send + Sync {
    fn fetch(&self, epoch: Epoch) -> std::result::Result<Observation, FetchError>;
}

/// Scene source over observations already in memory.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    before: std::result::Result<Observation, FetchError>,
    after: std::result::Result<Observation, FetchError>,
}

impl InMemorySource {
    pub fn new(before: Observation, after: Observation) -> Self {
        Self {
            before: Ok(before),
            after: Ok(after),
        }
    }

    pub fn with_results(
        before: std::result::Result<Observation, FetchError>,
        after: std::result::Result<Observation, FetchError>,
    ) -> Self {
        Self { before, after }
    }
}

impl SceneSource for InMemorySource {
    fn fetch(&self, epoch: Epoch) -> std::result::Result<Observation, FetchError> {
        match epoch {
            Epoch::Before => self.before.clone(),
            Epoch::After => self.after.clone(),
        }
    }
}

/// Band values of one date as stored in a JSON scene file.
///
/// `mask` holds 0/1 flags. `scl` is a Sentinel-2 scene classification layer;
/// when present its cloud classes are masked as well.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SceneFile {
    pub width: usize,
    pub height: usize,
    pub red: Vec<u16>,
    pub nir: Vec<u16>,
    #[serde(default)]
    pub mask: Option<Vec<u8>>,
    #[serde(default)]
    pub scl: Option<Vec<u8>>,
}

impl SceneFile {
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn observation(&self) -> Result<Observation> {
        let shape = self.shape();
        let red = Grid::new(shape, self.red.clone())?;
        let nir = Grid::new(shape, self.nir.clone())?;

        let data_mask = match &self.mask {
            Some(flags) => ValidityMask::from_flags(shape, flags)?,
            None => ValidityMask::all_valid(shape),
        };
        let mask = match &self.scl {
            Some(scl) => mask_from_scl(&Grid::new(shape, scl.clone())?, Some(&data_mask))?,
            None => data_mask,
        };

        NDI::ndvi().calculate(&[&nir, &red], &mask)
    }
}

/// Reads each date from its own file: a JSON scene file, or with the `gdal`
/// feature a directory holding `B04.tif`, `B08.tif` and optionally `SCL.tif`.
#[derive(Debug, Clone)]
pub struct FileSceneSource {
    before: PathBuf,
    after: PathBuf,
}

impl FileSceneSource {
    pub fn new(before: impl Into<PathBuf>, after: impl Into<PathBuf>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
        }
    }

    pub fn path(&self, epoch: Epoch) -> &Path {
        match epoch {
            Epoch::Before => &self.before,
            Epoch::After => &self.after,
        }
    }
}

impl SceneSource for FileSceneSource {
    fn fetch(&self, epoch: Epoch) -> std::result::Result<Observation, FetchError> {
        let path = self.path(epoch);
        debug!(%epoch, path = %path.display(), "loading scene");
        load_observation(path).map_err(|e| FetchError::new(format!("{}: {e}", path.display())))
    }
}

/// Load one date's observation from `path`.
pub fn load_observation(path: &Path) -> Result<Observation> {
    if path.is_dir() {
        return load_band_directory(path);
    }
    let content = fs::read_to_string(path)?;
    let scene: SceneFile = serde_json::from_str(&content)?;
    scene.observation()
}

#[cfg(feature = "gdal")]
fn load_band_directory(path: &Path) -> Result<Observation> {
    super::reader::read_band_directory(path)
}

#[cfg(not(feature = "gdal"))]
fn load_band_directory(path: &Path) -> Result<Observation> {
    Err(crate::error::AnalysisError::Unsupported(format!(
        "{} is a band directory; GeoTIFF input needs the `gdal` feature",
        path.display()
    )))
}

// src/io/reader.rs
use std::path::Path;

use gdal::{Dataset, GeoTransform};
use tracing::debug;

use crate::error::Result;
use crate::grid::{Grid, ValidityMask};
use crate::processing::indices::{IndexCalculator, Observation, NDI};
use crate::utils::mask::mask_from_scl;

/// Band file names inside a scene directory.
pub const RED_BAND: &str = "B04.tif";
pub const NIR_BAND: &str = "B08.tif";
pub const SCL_BAND: &str = "SCL.tif";

pub struct GeoInfo {
    pub projection: String,
    pub geo_transform: GeoTransform,
    pub width: usize,
    pub height: usize,
}

/// Read band 1 of a raster as `u16`.
pub fn read_band(path: &Path) -> Result<(Grid<u16>, GeoInfo)> {
    let dataset = Dataset::open(path)?;
    let (width, height) = dataset.raster_size();
    let band = dataset.rasterband(1)?;
    let buffer = band.read_as::<u16>((0, 0), (width, height), (width, height), None)?;

    let geo_info = GeoInfo {
        projection: dataset.projection(),
        geo_transform: dataset.geo_transform()?,
        width,
        height,
    };
    debug!(path = %path.display(), width, height, "read band");

    Ok((Grid::new(buffer.shape(), buffer.data().to_vec())?, geo_info))
}

/// NIR/red observation from two band files, masked by an optional SCL raster.
pub fn read_observation(
    nir_path: &Path,
    red_path: &Path,
    scl_path: Option<&Path>,
) -> Result<(Observation, GeoInfo)> {
    let (nir, geo_info) = read_band(nir_path)?;
    let (red, _) = read_band(red_path)?;

    let mask = match scl_path {
        Some(path) => {
            let (scl, _) = read_band(path)?;
            let scl = scl.map(|&v| u8::try_from(v).unwrap_or(0));
            mask_from_scl(&scl, None)?
        }
        None => ValidityMask::all_valid(nir.shape()),
    };

    let observation = NDI::ndvi().calculate(&[&nir, &red], &mask)?;
    Ok((observation, geo_info))
}

/// Observation from a scene directory holding `B04.tif`, `B08.tif` and
/// optionally `SCL.tif`.
pub fn read_band_directory(dir: &Path) -> Result<Observation> {
    let scl = dir.join(SCL_BAND);
    let scl_path = scl.exists().then_some(scl.as_path());
    let (observation, _) = read_observation(&dir.join(NIR_BAND), &dir.join(RED_BAND), scl_path)?;
    Ok(observation)
}

// src/io/writer.rs
use std::path::Path;

use gdal::raster::{Buffer, RasterCreationOptions};
use gdal::{Dataset, DriverManager, Metadata};
use tracing::info;

use super::reader::GeoInfo;
use crate::error::Result;
use crate::processing::classify::{category_code, CategoryGrid, MASKED_CODE};
use crate::processing::indices::{IndexGrid, IndexSample};
use crate::utils::fixed_point::{to_fixed_point, to_nodata_floats, NODATA_VALUE_INT};

fn create_options() -> RasterCreationOptions {
    RasterCreationOptions::from_iter(["COMPRESS=DEFLATE", "TILED=YES", "NUM_THREADS=ALL_CPUS"])
}

fn georeference(dataset: &mut Dataset, geo_info: &GeoInfo) -> Result<()> {
    dataset.set_projection(&geo_info.projection)?;
    dataset.set_geo_transform(&geo_info.geo_transform)?;
    Ok(())
}

/// Write an index grid as a single-band GeoTIFF, either int16 scaled by
/// `scale_factor` or float32 with -999 NoData.
pub fn write_index_raster(
    index: &IndexGrid,
    geo_info: &GeoInfo,
    output_path: &Path,
    use_fixed_point: bool,
    scale_factor: i32,
    name: &str,
) -> Result<()> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let shape = index.shape();

    if use_fixed_point {
        // Create int16 output
        let mut out_ds = driver.create_with_band_type_with_options::<i16, _>(
            output_path,
            shape.0,
            shape.1,
            1,
            &create_options(),
        )?;
        georeference(&mut out_ds, geo_info)?;

        let mut band = out_ds.rasterband(1)?;
        band.set_no_data_value(Some(NODATA_VALUE_INT as f64))?;
        band.set_metadata_item("SCALE", &format!("{}", 1.0 / scale_factor as f64), "")?;
        band.set_metadata_item("OFFSET", "0", "")?;
        band.set_description(&format!("{name} (scaled by {scale_factor})"))?;

        let fixed_data = to_fixed_point(index, scale_factor, NODATA_VALUE_INT);
        let mut buffer = Buffer::new(shape, fixed_data);
        band.write((0, 0), shape, &mut buffer)?;
        out_ds.flush_cache()?;
    } else {
        // Create float32 output
        let mut out_ds = driver.create_with_band_type_with_options::<f32, _>(
            output_path,
            shape.0,
            shape.1,
            1,
            &create_options(),
        )?;
        georeference(&mut out_ds, geo_info)?;

        let mut band = out_ds.rasterband(1)?;
        band.set_no_data_value(Some(IndexSample::NODATA as f64))?;
        band.set_description(name)?;

        let mut buffer = Buffer::new(shape, to_nodata_floats(index));
        band.write((0, 0), shape, &mut buffer)?;
        out_ds.flush_cache()?;
    }

    info!(path = %output_path.display(), fixed_point = use_fixed_point, "wrote index raster");
    Ok(())
}

/// Write a category grid as int16 GeoTIFF with -1 NoData.
pub fn write_category_raster(
    categories: &CategoryGrid,
    geo_info: &GeoInfo,
    output_path: &Path,
) -> Result<()> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let shape = categories.shape();

    let mut out_ds = driver.create_with_band_type_with_options::<i16, _>(
        output_path,
        shape.0,
        shape.1,
        1,
        &create_options(),
    )?;
    georeference(&mut out_ds, geo_info)?;

    let mut band = out_ds.rasterband(1)?;
    band.set_no_data_value(Some(f64::from(MASKED_CODE)))?;
    band.set_description("land cover")?;

    let codes = categories
        .iter()
        .map(|&c| i16::from(category_code(c)))
        .collect();
    let mut buffer = Buffer::new(shape, codes);
    band.write((0, 0), shape, &mut buffer)?;
    out_ds.flush_cache()?;

    info!(path = %output_path.display(), "wrote category raster");
    Ok(())
}

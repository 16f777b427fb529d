// src/utils/fixed_point.rs
use crate::processing::indices::{IndexGrid, IndexSample};

/// NoData value of scaled int16 index rasters.
pub const NODATA_VALUE_INT: i16 = -10000;

/// Scale index samples to int16, writing `nodata_value` for invalid pixels.
pub fn to_fixed_point(index: &IndexGrid, scale_factor: i32, nodata_value: i16) -> Vec<i16> {
    index
        .iter()
        .map(|sample| match sample {
            IndexSample::Valid(value) => {
                // Clamp to avoid overflow and scale
                let clamped = value.clamp(-0.9999, 0.9999);
                (clamped * scale_factor as f32).round() as i16
            }
            IndexSample::Invalid => nodata_value,
        })
        .collect()
}

/// Index samples as float32 with the -999 NoData marker.
pub fn to_nodata_floats(index: &IndexGrid) -> Vec<f32> {
    index.iter().map(|s| s.to_nodata_f32()).collect()
}

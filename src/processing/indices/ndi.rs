// src/processing/indices/ndi.rs
use ndarray::Zip;

use crate::error::{AnalysisError, Result};
use crate::grid::{Grid, ValidityMask};
use crate::processing::indices::{IndexCalculator, IndexSample, Observation};

/// Normalized Difference Index (NDI) calculator: `(A - B) / (A + B)`
pub struct NDI {
    band_a_index: usize,
    band_b_index: usize,
    name: String,
}

impl NDI {
    pub fn new(band_a_index: usize, band_b_index: usize, name: Option<String>) -> Self {
        Self {
            band_a_index,
            band_b_index,
            name: name.unwrap_or_else(|| "NDI".to_string()),
        }
    }

    /// NDVI over `[nir, red]` inputs.
    pub fn ndvi() -> Self {
        Self::new(0, 1, Some("NDVI".to_string()))
    }

    fn band<'a>(&self, inputs: &[&'a Grid<u16>], index: usize) -> Result<&'a Grid<u16>> {
        inputs
            .get(index)
            .copied()
            .ok_or(AnalysisError::MissingBands {
                required: self.required_bands().max(index + 1),
                provided: inputs.len(),
            })
    }
}

impl IndexCalculator for NDI {
    fn calculate(&self, inputs: &[&Grid<u16>], mask: &ValidityMask) -> Result<Observation> {
        let band_a = self.band(inputs, self.band_a_index)?;
        let band_b = self.band(inputs, self.band_b_index)?;
        band_a.ensure_same_shape(band_b, "band B")?;
        band_a.ensure_same_shape(mask, "validity mask")?;

        let index = Zip::from(band_a.array())
            .and(band_b.array())
            .and(mask.array())
            .par_map_collect(|&a, &b, &valid| {
                let a_val = f32::from(a);
                let b_val = f32::from(b);
                let denominator = a_val + b_val;

                if valid && denominator > 0.0 {
                    let value = (a_val - b_val) / denominator;
                    debug_assert!((-1.0..=1.0).contains(&value));
                    IndexSample::Valid(value)
                } else {
                    IndexSample::Invalid
                }
            });
        let effective_mask = index.map(|s| s.is_valid());

        Ok(Observation {
            index: Grid::from_array(index),
            mask: Grid::from_array(effective_mask),
            clear: mask.clone(),
        })
    }

    fn required_bands(&self) -> usize {
        2 // NDI requires exactly 2 bands
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// src/processing/indices/mod.rs
pub mod ndi;

pub use ndi::NDI;

use crate::error::Result;
use crate::grid::{Grid, ValidityMask};

/// Index value of one pixel. Pixels that could not be computed carry no number.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum IndexSample {
    Valid(f32),
    #[default]
    Invalid,
}

impl IndexSample {
    /// NoData marker used only when an index grid leaves the crate as raw floats.
    pub const NODATA: f32 = -999.0;

    pub fn value(self) -> Option<f32> {
        match self {
            IndexSample::Valid(v) => Some(v),
            IndexSample::Invalid => None,
        }
    }

    pub fn is_valid(self) -> bool {
        matches!(self, IndexSample::Valid(_))
    }

    pub fn to_nodata_f32(self) -> f32 {
        self.value().unwrap_or(Self::NODATA)
    }
}

pub type IndexGrid = Grid<IndexSample>;

/// One date's index grid with the mask that agrees with it pixel for pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub index: IndexGrid,
    pub mask: ValidityMask,
    /// Cloud and no-data mask the index was computed under. Pixels it keeps
    /// can still be missing from `mask` when the index is undefined there.
    pub clear: ValidityMask,
}

impl Observation {
    pub fn shape(&self) -> (usize, usize) {
        self.index.shape()
    }
}

/// Common interface for all spectral index calculators
pub trait IndexCalculator: Send + Sync {
    /// Calculate the index from the provided input bands, restricted to `mask`.
    ///
    /// The returned observation's mask is the input mask narrowed to pixels
    /// where the index could be computed.
    fn calculate(&self, inputs: &[&Grid<u16>], mask: &ValidityMask) -> Result<Observation>;

    /// Return the number of required input bands
    fn required_bands(&self) -> usize;

    /// Return the name of the index
    fn name(&self) -> &str;
}

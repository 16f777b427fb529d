// src/grid.rs
use ndarray::{Array2, Zip};

use crate::error::{AnalysisError, Result};

/// Raster stored as an `Array2` indexed `(row, col)`.
///
/// Shapes are reported as `(width, height)`, the same order GDAL buffers use,
/// so a grid can be built straight from a band read.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    data: Array2<T>,
}

impl<T> Grid<T> {
    /// Grid from row-major pixel values.
    pub fn new(shape: (usize, usize), data: Vec<T>) -> Result<Self> {
        let actual = data.len();
        if shape.0 * shape.1 != actual {
            return Err(AnalysisError::DataLength { shape, actual });
        }
        let data = Array2::from_shape_vec((shape.1, shape.0), data)
            .map_err(|_| AnalysisError::DataLength { shape, actual })?;
        Ok(Self { data })
    }

    pub fn from_array(data: Array2<T>) -> Self {
        Self { data }
    }

    pub fn filled(shape: (usize, usize), value: T) -> Self
    where
        T: Clone,
    {
        Self {
            data: Array2::from_elem((shape.1, shape.0), value),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn array(&self) -> &Array2<T> {
        &self.data
    }

    /// Pixels in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.data.iter()
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.data.iter().cloned().collect()
    }

    pub fn map<U, F>(&self, f: F) -> Grid<U>
    where
        F: FnMut(&T) -> U,
    {
        Grid {
            data: self.data.map(f),
        }
    }

    /// Fails fast when `other` does not share this grid's shape.
    pub fn ensure_same_shape<U>(&self, other: &Grid<U>, what: &'static str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(AnalysisError::ShapeMismatch {
                what,
                expected: self.shape(),
                actual: other.shape(),
            });
        }
        Ok(())
    }
}

/// Per-pixel usability: `true` means free of cloud and no-data.
pub type ValidityMask = Grid<bool>;

impl Grid<bool> {
    pub fn all_valid(shape: (usize, usize)) -> Self {
        Self::filled(shape, true)
    }

    /// Builds a mask from 0/1 flags. Any other flag value is rejected.
    pub fn from_flags(shape: (usize, usize), flags: &[u8]) -> Result<Self> {
        let data = flags
            .iter()
            .enumerate()
            .map(|(index, &value)| match value {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(AnalysisError::InvalidMaskFlag { index, value }),
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(shape, data)
    }

    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn masked_count(&self) -> usize {
        self.len() - self.valid_count()
    }

    /// Share of masked pixels in percent, 0 for an empty mask.
    pub fn masked_share(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.masked_count() as f64 / self.len() as f64 * 100.0
        }
    }

    /// Pixels valid in both masks.
    pub fn intersect(&self, other: &ValidityMask) -> Result<ValidityMask> {
        self.ensure_same_shape(other, "second mask")?;
        let data = Zip::from(&self.data)
            .and(&other.data)
            .map_collect(|&a, &b| a && b);
        Ok(Self { data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_is_width_by_height() {
        let grid = Grid::new((3, 2), vec![1u16, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(grid.shape(), (3, 2));
        assert_eq!(grid.array()[[1, 0]], 4);
        assert_eq!(grid.to_vec(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn intersect_requires_same_shape() {
        let a = ValidityMask::from_flags((2, 1), &[1, 0]).unwrap();
        let b = ValidityMask::from_flags((2, 1), &[1, 1]).unwrap();
        assert_eq!(a.intersect(&b).unwrap().to_vec(), vec![true, false]);
        assert_eq!(a.masked_share(), 50.0);
        assert!(a.intersect(&ValidityMask::all_valid((1, 2))).is_err());
    }
}

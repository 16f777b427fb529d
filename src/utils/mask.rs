// src/utils/mask.rs
//! Validity masks from the Sentinel-2 scene classification layer (SCL).

use crate::error::Result;
use crate::grid::{Grid, ValidityMask};

/// SCL class with no data.
pub const SCL_NO_DATA: u8 = 0;

/// SCL classes that make a pixel unusable: cloud shadow (3), cloud medium
/// probability (8), cloud high probability (9), thin cirrus (10), snow (11).
pub const SCL_CLOUD_CLASSES: [u8; 5] = [3, 8, 9, 10, 11];

pub fn is_obstructed(scl: u8) -> bool {
    scl == SCL_NO_DATA || SCL_CLOUD_CLASSES.contains(&scl)
}

/// Mask pixels whose SCL class is cloud-like or no-data, intersected with
/// `data_mask` when given.
pub fn mask_from_scl(scl: &Grid<u8>, data_mask: Option<&ValidityMask>) -> Result<ValidityMask> {
    let clear = scl.map(|&class| !is_obstructed(class));
    match data_mask {
        Some(data_mask) => clear.intersect(data_mask),
        None => Ok(clear),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_classes_are_masked() {
        let scl = Grid::new((4, 2), vec![4, 5, 3, 8, 9, 10, 11, 6]).unwrap();
        let mask = mask_from_scl(&scl, None).unwrap();
        assert_eq!(
            mask.to_vec(),
            vec![true, true, false, false, false, false, false, true]
        );
    }

    #[test]
    fn data_mask_is_intersected() {
        let scl = Grid::new((3, 1), vec![4, 4, 0]).unwrap();
        let data = ValidityMask::from_flags((3, 1), &[1, 0, 1]).unwrap();
        let mask = mask_from_scl(&scl, Some(&data)).unwrap();
        assert_eq!(mask.to_vec(), vec![true, false, false]);
    }
}

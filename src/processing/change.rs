// src/processing/change.rs
//! Change raster between two category grids.

use image::{Rgba, RgbaImage};
use ndarray::Zip;

use crate::error::{AnalysisError, Result};
use crate::grid::{Grid, ValidityMask};
use crate::processing::classify::{CategoryGrid, LandCover};

/// Masks of the earlier and later date. `None` means every pixel is usable.
pub type MaskPair<'a> = Option<(&'a ValidityMask, &'a ValidityMask)>;

/// Comparably valid and unchanged.
pub const NO_CHANGE: Rgba<u8> = Rgba([0, 0, 0, 0]);
/// Not valid on at least one date.
pub const NOT_COMPARABLE: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Color intensity for a transition spanning `magnitude` classes.
pub fn change_intensity(magnitude: u8) -> u8 {
    (100 + 40 * u32::from(magnitude)).min(255) as u8
}

/// Color of a signed class change: green for gains, red for losses.
pub fn change_color(change: i8) -> Rgba<u8> {
    let intensity = change_intensity(change.unsigned_abs());
    match change {
        0 => NO_CHANGE,
        c if c > 0 => Rgba([0, intensity, 0, 255]),
        _ => Rgba([intensity, 0, 0, 255]),
    }
}

pub(crate) fn check_mask_pair(reference: &CategoryGrid, masks: MaskPair<'_>) -> Result<()> {
    if let Some((before, after)) = masks {
        reference.ensure_same_shape(before, "earlier mask")?;
        reference.ensure_same_shape(after, "later mask")?;
    }
    Ok(())
}

fn class_difference(before: &Option<LandCover>, after: &Option<LandCover>) -> Option<i8> {
    match (before, after) {
        (Some(b), Some(a)) => Some(a.code() - b.code()),
        _ => None,
    }
}

/// Per-pixel `after - before` class difference, `None` where the pixel is not
/// comparably valid.
pub fn signed_changes(
    before: &CategoryGrid,
    after: &CategoryGrid,
    masks: MaskPair<'_>,
) -> Result<Grid<Option<i8>>> {
    before.ensure_same_shape(after, "later category grid")?;
    check_mask_pair(before, masks)?;

    let classes = Zip::from(before.array()).and(after.array());
    let changes = match masks {
        Some((before_mask, after_mask)) => classes
            .and(before_mask.array())
            .and(after_mask.array())
            .par_map_collect(|b, a, &valid_b, &valid_a| {
                if valid_b && valid_a {
                    class_difference(b, a)
                } else {
                    None
                }
            }),
        None => classes.par_map_collect(class_difference),
    };
    Ok(Grid::from_array(changes))
}

/// Render the transition between two dates as an RGBA raster.
///
/// Unchanged pixels are fully transparent, gains green, losses red, and pixels
/// not comparably valid opaque black.
pub fn change_raster(
    before: &CategoryGrid,
    after: &CategoryGrid,
    masks: MaskPair<'_>,
) -> Result<RgbaImage> {
    let changes = signed_changes(before, after, masks)?;
    let pixels: Vec<u8> = changes
        .iter()
        .flat_map(|change| change.map_or(NOT_COMPARABLE, change_color).0)
        .collect();

    let (width, height) = before.shape();
    RgbaImage::from_raw(width as u32, height as u32, pixels).ok_or(AnalysisError::DataLength {
        shape: (width, height),
        actual: before.len(),
    })
}

// src/render/palette.rs
//! Color tables for classification maps and the diagnostic chart.

use image::{Rgb, RgbImage};

use crate::error::{AnalysisError, Result};
use crate::processing::classify::{CategoryGrid, LandCover};

/// Color of a category cell on the classification map.
pub fn class_color(category: Option<LandCover>) -> Rgb<u8> {
    match category {
        None => Rgb([0, 0, 0]),
        Some(LandCover::Water) => Rgb([0, 0, 255]),
        Some(LandCover::BareUrban) => Rgb([128, 128, 128]),
        Some(LandCover::SparseVegetation) => Rgb([255, 255, 128]),
        Some(LandCover::ModerateVegetation) => Rgb([144, 238, 144]),
        Some(LandCover::DenseVegetation) => Rgb([34, 139, 34]),
    }
}

/// Render a category grid with [`class_color`].
pub fn classification_map(categories: &CategoryGrid) -> Result<RgbImage> {
    let (width, height) = categories.shape();
    let pixels: Vec<u8> = categories.iter().flat_map(|&c| class_color(c).0).collect();
    RgbImage::from_raw(width as u32, height as u32, pixels).ok_or(AnalysisError::DataLength {
        shape: (width, height),
        actual: categories.len(),
    })
}

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: [u8; 3],
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self { t, color: [r, g, b] }
    }
}

/// Red -> yellow -> green, for signed NDVI change.
pub const RED_YELLOW_GREEN: &[ColorStop] = &[
    ColorStop::new(0.00, 165, 0, 38),
    ColorStop::new(0.25, 244, 109, 67),
    ColorStop::new(0.50, 255, 255, 191),
    ColorStop::new(0.75, 102, 189, 99),
    ColorStop::new(1.00, 0, 104, 55),
];

/// Linear interpolation between stops at `t`, clamped to [0, 1].
pub fn evaluate(stops: &[ColorStop], t: f64) -> Rgb<u8> {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    let Some(first) = stops.first() else {
        return Rgb([0, 0, 0]);
    };
    if t <= first.t {
        return Rgb(first.color);
    }
    for pair in stops.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.t {
            let span = hi.t - lo.t;
            let f = if span > 0.0 { (t - lo.t) / span } else { 0.0 };
            let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * f).round() as u8;
            return Rgb([
                lerp(lo.color[0], hi.color[0]),
                lerp(lo.color[1], hi.color[1]),
                lerp(lo.color[2], hi.color[2]),
            ]);
        }
    }
    stops.last().map_or(Rgb([0, 0, 0]), |s| Rgb(s.color))
}

/// Color of `value` on the red-yellow-green ramp spanning `[min, max]`.
pub fn diverging_color(value: f64, min: f64, max: f64) -> Rgb<u8> {
    let span = max - min;
    let t = if span > 0.0 { (value - min) / span } else { 0.5 };
    evaluate(RED_YELLOW_GREEN, t)
}

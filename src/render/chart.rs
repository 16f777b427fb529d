// src/render/chart.rs
//! Diagnostic scatter chart for the urban-gain / NDVI-change regression.
//!
//! Drawing is kept apart from the numeric analysis. The subsample of plotted
//! points comes from the `Rng` handed to [`DiagnosticRenderer::render`]; pass a
//! seeded generator to get identical charts across runs.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut,
    draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use itertools::Itertools;
use rand::seq::index;
use rand::Rng;
use rusttype::{Font, Scale};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::processing::correlation::{ChangeSamples, CorrelationReport};
use crate::render::palette::diverging_color;

/// Embedded font data - DejaVu Sans Mono
const FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const FRAME: Rgba<u8> = Rgba([60, 60, 60, 255]);
const GRID: Rgba<u8> = Rgba([225, 225, 225, 255]);
const ZERO_LINE: Rgba<u8> = Rgba([0, 0, 0, 255]);
const FIT_LINE: Rgba<u8> = Rgba([220, 20, 20, 255]);
const TEXT: Rgba<u8> = Rgba([20, 20, 20, 255]);

/// Horizontal extent of the plot; urban gain only takes the values 0 and 1.
const X_DOMAIN: (f64, f64) = (-0.15, 1.15);
/// Gap between the plot frame and the colour bar.
const COLORBAR_GAP: u32 = 30;
/// Room right of the colour bar for its tick values.
const COLORBAR_TICKS: u32 = 10;
/// Top edge of the title text.
const TITLE_TOP: i32 = 8;

const X_LABEL: &str = "Urban Gain (0 = No, 1 = Yes)";
const Y_LABEL: &str = "NDVI Change";
const COLORBAR_LABEL: &str = "NDVI Change";

/// Chart layout and color settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub colorbar_width: u32,
    pub point_radius: i32,
    /// Index change mapped to the red end of the ramp.
    pub color_min: f64,
    /// Index change mapped to the green end of the ramp.
    pub color_max: f64,
    /// Upper bound on plotted points.
    pub max_points: usize,
    pub title_size: f32,
    pub label_size: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            margin: 60,
            colorbar_width: 20,
            point_radius: 2,
            color_min: -0.5,
            color_max: 0.5,
            max_points: 10_000,
            title_size: 18.0,
            label_size: 14.0,
        }
    }
}

impl RendererConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let overflow = || {
            ConfigError::InvalidRenderer(format!(
                "margin {} with colorbar width {} is out of range",
                self.margin, self.colorbar_width
            ))
        };
        let horizontal = self
            .margin
            .checked_mul(2)
            .and_then(|m| m.checked_add(self.colorbar_width))
            .and_then(|m| m.checked_add(COLORBAR_GAP + COLORBAR_TICKS))
            .ok_or_else(overflow)?;
        let vertical = self.margin.checked_mul(2).ok_or_else(overflow)?;
        if self.width <= horizontal || self.height <= vertical {
            return Err(ConfigError::InvalidRenderer(format!(
                "{}x{} canvas leaves no plot area with margin {}",
                self.width, self.height, self.margin
            )));
        }
        if self.colorbar_width == 0 || self.point_radius < 0 {
            return Err(ConfigError::InvalidRenderer(
                "colorbar width and point radius must be positive".to_string(),
            ));
        }
        if !(self.color_min < self.color_max) {
            return Err(ConfigError::InvalidRenderer(format!(
                "color domain [{}, {}] is empty",
                self.color_min, self.color_max
            )));
        }
        if self.max_points == 0 {
            return Err(ConfigError::InvalidRenderer(
                "max_points must be positive".to_string(),
            ));
        }
        for size in [self.title_size, self.label_size] {
            if !(size.is_finite() && size > 0.0) {
                return Err(ConfigError::InvalidRenderer(format!(
                    "font size {size} must be positive"
                )));
            }
        }
        Ok(())
    }
}

/// Rendered chart plus the annotations drawn on it.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticChart {
    #[serde(skip)]
    pub image: RgbaImage,
    pub title: String,
    pub fit_label: String,
    pub sampled_points: usize,
}

struct PlotArea {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
    y_min: f64,
    y_max: f64,
}

impl PlotArea {
    fn px(&self, x: f64) -> f32 {
        (self.left + (x - X_DOMAIN.0) / (X_DOMAIN.1 - X_DOMAIN.0) * (self.right - self.left)) as f32
    }

    fn py(&self, y: f64) -> f32 {
        (self.bottom - (y - self.y_min) / (self.y_max - self.y_min) * (self.bottom - self.top)) as f32
    }
}

pub struct DiagnosticRenderer {
    config: RendererConfig,
    font: Font<'static>,
}

impl DiagnosticRenderer {
    pub fn new(config: RendererConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let font = Font::try_from_bytes(FONT_DATA).ok_or_else(|| {
            ConfigError::InvalidRenderer("embedded chart font could not be parsed".to_string())
        })?;
        Ok(Self { config, font })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Uniform sample of `min(max_points, total)` distinct positions.
    pub fn sample_indices<R: Rng + ?Sized>(&self, total: usize, rng: &mut R) -> Vec<usize> {
        let amount = total.min(self.config.max_points);
        index::sample(rng, total, amount).into_vec()
    }

    pub fn render<R: Rng + ?Sized>(
        &self,
        samples: &ChangeSamples,
        report: &CorrelationReport,
        rng: &mut R,
    ) -> DiagnosticChart {
        let cfg = &self.config;
        let picked = self.sample_indices(samples.len(), rng);
        let points: Vec<(f64, f64)> = picked
            .iter()
            .map(|&i| (f64::from(samples.urban_gain[i]), samples.index_change[i]))
            .collect();

        let slope = report.regression.coefficient;
        let intercept = report.regression.intercept;
        let fit = [(0.0, intercept), (1.0, slope + intercept)];

        let correlation = &report.correlation;
        let title = format!(
            "Pearson r = {:.3}, R² = {:.3}, p = {:.4}",
            correlation.r, correlation.r_squared, correlation.p_value
        );
        let fit_label = format!("Linear fit: y = {:.3}x + {:.3}", slope, intercept);

        let area = self.plot_area(&points, &fit);
        let mut image = RgbaImage::from_pixel(cfg.width, cfg.height, BACKGROUND);

        self.draw_grid(&mut image, &area);
        self.draw_zero_line(&mut image, &area);

        for &(x, y) in &points {
            let color = diverging_color(y, cfg.color_min, cfg.color_max);
            draw_filled_circle_mut(
                &mut image,
                (area.px(x).round() as i32, area.py(y).round() as i32),
                cfg.point_radius,
                Rgba([color[0], color[1], color[2], 255]),
            );
        }

        let (start, end) = (
            (area.px(fit[0].0), area.py(fit[0].1)),
            (area.px(fit[1].0), area.py(fit[1].1)),
        );
        for offset in [-1.0, 0.0, 1.0] {
            draw_line_segment_mut(
                &mut image,
                (start.0, start.1 + offset),
                (end.0, end.1 + offset),
                FIT_LINE,
            );
        }

        draw_hollow_rect_mut(
            &mut image,
            Rect::at(area.left as i32, area.top as i32).of_size(
                (area.right - area.left) as u32,
                (area.bottom - area.top) as u32,
            ),
            FRAME,
        );
        self.draw_colorbar(&mut image, &area);
        self.draw_annotations(&mut image, &area, &title, &fit_label);

        DiagnosticChart {
            image,
            title,
            fit_label,
            sampled_points: points.len(),
        }
    }

    fn plot_area(&self, points: &[(f64, f64)], fit: &[(f64, f64)]) -> PlotArea {
        let cfg = &self.config;
        let (lo, hi) = points
            .iter()
            .chain(fit)
            .map(|&(_, y)| y)
            .filter(|y| y.is_finite())
            .minmax()
            .into_option()
            .unwrap_or((0.0, 0.0));
        // Keep zero in view for the reference line
        let (mut y_min, mut y_max) = (lo.min(0.0), hi.max(0.0));
        let pad = ((y_max - y_min) * 0.05).max(0.05);
        y_min -= pad;
        y_max += pad;

        PlotArea {
            left: f64::from(cfg.margin),
            right: f64::from(
                cfg.width - cfg.margin - cfg.colorbar_width - COLORBAR_GAP - COLORBAR_TICKS,
            ),
            top: f64::from(cfg.margin),
            bottom: f64::from(cfg.height - cfg.margin),
            y_min,
            y_max,
        }
    }

    fn draw_grid(&self, image: &mut RgbaImage, area: &PlotArea) {
        for x in [0.0, 1.0] {
            let px = area.px(x);
            draw_line_segment_mut(image, (px, area.top as f32), (px, area.bottom as f32), GRID);
        }
        for step in 1..5 {
            let y = area.y_min + (area.y_max - area.y_min) * f64::from(step) / 5.0;
            let py = area.py(y);
            draw_line_segment_mut(image, (area.left as f32, py), (area.right as f32, py), GRID);
        }
    }

    fn draw_zero_line(&self, image: &mut RgbaImage, area: &PlotArea) {
        let py = area.py(0.0);
        let mut x = area.left;
        while x < area.right {
            let end = (x + 6.0).min(area.right);
            draw_line_segment_mut(image, (x as f32, py), (end as f32, py), ZERO_LINE);
            x += 10.0;
        }
    }

    fn colorbar_left(&self, area: &PlotArea) -> i32 {
        area.right as i32 + COLORBAR_GAP as i32
    }

    fn draw_colorbar(&self, image: &mut RgbaImage, area: &PlotArea) {
        let cfg = &self.config;
        let left = self.colorbar_left(area);
        let top = area.top as i32;
        let bottom = area.bottom as i32;
        let rows = (bottom - top).max(1);

        for row in top..bottom {
            let t = f64::from(bottom - row) / f64::from(rows);
            let value = cfg.color_min + t * (cfg.color_max - cfg.color_min);
            let color = diverging_color(value, cfg.color_min, cfg.color_max);
            draw_filled_rect_mut(
                image,
                Rect::at(left, row).of_size(cfg.colorbar_width, 1),
                Rgba([color[0], color[1], color[2], 255]),
            );
        }
        draw_hollow_rect_mut(
            image,
            Rect::at(left, top).of_size(cfg.colorbar_width, rows as u32),
            FRAME,
        );
    }

    fn text(&self, image: &mut RgbaImage, x: i32, y: i32, size: f32, text: &str) {
        draw_text_mut(image, TEXT, x, y, Scale::uniform(size), &self.font, text);
    }

    /// Width and height of `text` at `size` pixels.
    fn measure(&self, size: f32, text: &str) -> (i32, i32) {
        text_size(Scale::uniform(size), &self.font, text)
    }

    /// Title, axis labels, fit legend and colour bar labels.
    fn draw_annotations(&self, image: &mut RgbaImage, area: &PlotArea, title: &str, fit_label: &str) {
        let cfg = &self.config;
        let label = cfg.label_size;
        let (left, right) = (area.left as i32, area.right as i32);
        let (top, bottom) = (area.top as i32, area.bottom as i32);

        let (title_width, _) = self.measure(cfg.title_size, title);
        let title_x = (cfg.width as i32 - title_width) / 2;
        self.text(image, title_x.max(0), TITLE_TOP, cfg.title_size, title);

        let label_height = label.ceil() as i32;
        self.text(image, left, top - label_height - 6, label, Y_LABEL);

        for (x, tick) in [(0.0, "0"), (1.0, "1")] {
            let (tick_width, _) = self.measure(label, tick);
            self.text(image, area.px(x) as i32 - tick_width / 2, bottom + 4, label, tick);
        }
        let (x_label_width, _) = self.measure(label, X_LABEL);
        self.text(
            image,
            (left + right - x_label_width) / 2,
            bottom + label_height + 10,
            label,
            X_LABEL,
        );

        // Legend box in the upper left of the plot
        let (legend_width, legend_height) = self.measure(label, fit_label);
        let swatch = 24;
        let (legend_x, legend_y) = (left + 10, top + 10);
        draw_filled_rect_mut(
            image,
            Rect::at(legend_x, legend_y).of_size(
                (swatch + legend_width + 18).max(1) as u32,
                (legend_height.max(label_height) + 10).max(1) as u32,
            ),
            BACKGROUND,
        );
        let line_y = (legend_y + 5 + label_height / 2) as f32;
        for offset in [-1.0, 0.0, 1.0] {
            draw_line_segment_mut(
                image,
                ((legend_x + 4) as f32, line_y + offset),
                ((legend_x + 4 + swatch) as f32, line_y + offset),
                FIT_LINE,
            );
        }
        self.text(image, legend_x + swatch + 10, legend_y + 5, label, fit_label);

        let bar_left = self.colorbar_left(area);
        let (bar_label_width, _) = self.measure(label, COLORBAR_LABEL);
        let bar_label_x = (bar_left + cfg.colorbar_width as i32 - bar_label_width)
            .min(cfg.width as i32 - bar_label_width)
            .max(0);
        self.text(image, bar_label_x, top - label_height - 6, label, COLORBAR_LABEL);

        let tick_x = bar_left + cfg.colorbar_width as i32 + 3;
        let small = label * 0.8;
        self.text(image, tick_x, top, small, &format!("{:.2}", cfg.color_max));
        self.text(
            image,
            tick_x,
            bottom - small.ceil() as i32,
            small,
            &format!("{:.2}", cfg.color_min),
        );
    }
}

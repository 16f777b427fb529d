// src/io/export.rs
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::Epoch;
use crate::error::Result;
use crate::processing::pipeline::AnalysisBundle;

pub const BUNDLE_FILE: &str = "analysis.json";
pub const CHANGE_IMAGE: &str = "change.png";
pub const CHART_IMAGE: &str = "regression_chart.png";

/// Write the bundle JSON and its rasters as PNG files into `dir`.
///
/// Returns the paths written, bundle JSON first.
pub fn export_bundle(bundle: &AnalysisBundle, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let json_path = dir.join(BUNDLE_FILE);
    fs::write(&json_path, serde_json::to_string_pretty(bundle)?)?;
    written.push(json_path);

    let change_path = dir.join(CHANGE_IMAGE);
    bundle.change_raster.save(&change_path)?;
    written.push(change_path);

    for (epoch, date) in [(Epoch::Before, &bundle.before), (Epoch::After, &bundle.after)] {
        let path = dir.join(format!("classification_{epoch}.png"));
        date.classification.save(&path)?;
        written.push(path);
    }

    if let Some(chart) = &bundle.chart {
        let path = dir.join(CHART_IMAGE);
        chart.image.save(&path)?;
        written.push(path);
    }

    info!(dir = %dir.display(), files = written.len(), "exported analysis");
    Ok(written)
}

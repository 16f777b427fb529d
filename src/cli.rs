// src/cli.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::BoundingBox;
use crate::processing::classify::ThresholdContext;

#[derive(Parser)]
#[command(name = "landcover-change")]
#[command(about = "Two-date NDVI land-cover change and urban-expansion analysis")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output path (directory for analyses)
    #[arg(short, long, default_value = "output", global = true)]
    pub output: PathBuf,

    /// Seed for the chart subsample; omit for a fresh sample each run
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Skip the diagnostic regression chart
    #[arg(long, global = true)]
    pub no_chart: bool,

    /// Classification threshold context
    #[arg(long, default_value = "urban", global = true)]
    pub context: ThresholdContext,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify two dates and analyze the change between them
    Analyze {
        /// Earlier scene: JSON scene file or band directory
        #[arg(short = 'b', long)]
        before: PathBuf,

        /// Later scene: JSON scene file or band directory
        #[arg(short = 'a', long)]
        after: PathBuf,

        /// Bounding box as west,south,east,north
        #[arg(long, allow_hyphen_values = true)]
        bbox: Option<BoundingBox>,

        /// Year label of the earlier scene
        #[arg(long, default_value = "2018")]
        before_year: u16,

        /// Year label of the later scene
        #[arg(long, default_value = "2024")]
        after_year: u16,
    },

    /// Run the analyses listed in a JSON batch file
    Batch {
        /// Batch configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Worker threads (default: number of CPUs)
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Normalized Difference Vegetation Index: (NIR-RED)/(NIR+RED)
    #[cfg(feature = "gdal")]
    Ndvi {
        /// NIR band (A)
        #[arg(short = 'a', long)]
        nir: PathBuf,

        /// Red band (B)
        #[arg(short = 'b', long)]
        red: PathBuf,

        /// Scene classification layer used for cloud masking
        #[arg(long)]
        scl: Option<PathBuf>,

        /// Use float32 instead of int16
        #[arg(long)]
        float: bool,

        /// Scaling factor for fixed-point
        #[arg(long, default_value = "10000")]
        scale_factor: i32,

        /// Also write the land-cover classes as a GeoTIFF here
        #[arg(long)]
        classes: Option<PathBuf>,
    },
}

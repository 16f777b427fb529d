// src/main.rs
use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use landcover_change::batch::{load_batch_config, run_batch};
use landcover_change::cli::{Cli, Commands};
use landcover_change::config::{AnalysisConfig, EpochYears};
use landcover_change::io::{export_bundle, FileSceneSource};
use landcover_change::processing::pipeline::AnalysisPipeline;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Analyze {
            before,
            after,
            bbox,
            before_year,
            after_year,
        } => {
            let config = AnalysisConfig {
                context: cli.context,
                seed: cli.seed,
                render_chart: !cli.no_chart,
                years: EpochYears {
                    before: *before_year,
                    after: *after_year,
                },
                ..AnalysisConfig::default()
            };
            let pipeline = AnalysisPipeline::new(config)?;
            let source = FileSceneSource::new(before, after);
            let bundle = pipeline.run(&source, bbox.as_ref())?;
            export_bundle(&bundle, &cli.output)?;
            println!("Analysis complete: {}", cli.output.display());
        }
        Commands::Batch { config, workers } => {
            let mut batch = load_batch_config(config)?;
            if cli.seed.is_some() {
                batch.global.seed = cli.seed;
            }
            if cli.no_chart {
                batch.global.render_chart = false;
            }
            let report = run_batch(&batch, *workers)?;
            for (name, reason) in &report.failed {
                eprintln!("{name}: {reason}");
            }
            if !report.is_success() {
                bail!(
                    "{} of {} operations failed",
                    report.failed.len(),
                    report.failed.len() + report.succeeded.len()
                );
            }
            println!("Batch processing complete!");
        }
        #[cfg(feature = "gdal")]
        Commands::Ndvi {
            nir,
            red,
            scl,
            float,
            scale_factor,
            classes,
        } => {
            use landcover_change::io::{reader, writer};
            use landcover_change::processing::classify::classify;

            let (observation, geo_info) = reader::read_observation(nir, red, scl.as_deref())?;
            writer::write_index_raster(
                &observation.index,
                &geo_info,
                &cli.output,
                !float,
                *scale_factor,
                "NDVI",
            )?;
            if let Some(path) = classes {
                let categories = classify(&observation.index, Some(&observation.mask), cli.context)?;
                writer::write_category_raster(&categories, &geo_info, path)?;
            }
            println!("Processing complete: {}", cli.output.display());
        }
    }

    Ok(())
}

// src/batch.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::{AnalysisConfig, BoundingBox, EpochYears};
use crate::io::{export_bundle, FileSceneSource};
use crate::processing::classify::ThresholdContext;
use crate::processing::pipeline::AnalysisPipeline;

#[derive(Deserialize, Serialize, Debug)]
pub struct BatchConfig {
    #[serde(default)]
    pub global: AnalysisConfig,
    pub operations: Vec<Operation>,
}

/// One two-date analysis; unset fields fall back to `global`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub before: PathBuf,
    pub after: PathBuf,
    pub output: PathBuf,
    pub bbox: Option<BoundingBox>,
    pub seed: Option<u64>,
    pub render_chart: Option<bool>,
    pub context: Option<ThresholdContext>,
    pub years: Option<EpochYears>,
}

impl Operation {
    pub fn config(&self, global: &AnalysisConfig) -> AnalysisConfig {
        let mut config = global.clone();
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(render_chart) = self.render_chart {
            config.render_chart = render_chart;
        }
        if let Some(context) = self.context {
            config.context = context;
        }
        if let Some(years) = self.years {
            config.years = years;
        }
        config
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub fn load_batch_config(config_path: &Path) -> Result<BatchConfig> {
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("reading batch file {}", config_path.display()))?;
    let config: BatchConfig = serde_json::from_str(&config_content)
        .with_context(|| format!("parsing batch file {}", config_path.display()))?;
    Ok(config)
}

/// Run every operation on a pool of worker threads fed from a job queue.
///
/// A failing operation is recorded in the report and does not stop the others.
pub fn run_batch(config: &BatchConfig, workers: Option<usize>) -> Result<BatchReport> {
    let total = config.operations.len();
    let report = Mutex::new(BatchReport::default());
    if total == 0 {
        return Ok(report.into_inner());
    }

    let workers = workers.unwrap_or_else(num_cpus::get).clamp(1, total);
    info!(operations = total, workers, "starting batch");

    let (tx, rx) = flume::unbounded::<(usize, &Operation)>();
    for job in config.operations.iter().enumerate() {
        tx.send(job)
            .map_err(|e| anyhow!("failed to queue batch job: {e}"))?;
    }
    drop(tx);

    thread::scope(|scope| {
        for _ in 0..workers {
            let rx = rx.clone();
            let report = &report;
            scope.spawn(move || {
                for (i, op) in rx.iter() {
                    info!("[{}/{}] {} -> {}", i + 1, total, op.name, op.output.display());
                    match run_operation(op, &config.global) {
                        Ok(()) => report.lock().succeeded.push(op.name.clone()),
                        Err(e) => {
                            let reason = format!("{e:#}");
                            error!(operation = %op.name, %reason, "operation failed");
                            report.lock().failed.push((op.name.clone(), reason));
                        }
                    }
                }
            });
        }
    });

    let report = report.into_inner();
    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "batch complete"
    );
    Ok(report)
}

fn run_operation(op: &Operation, global: &AnalysisConfig) -> Result<()> {
    if let Some(bbox) = &op.bbox {
        bbox.validate()?;
    }
    let pipeline = AnalysisPipeline::new(op.config(global))?;
    let source = FileSceneSource::new(op.before.clone(), op.after.clone());
    let bundle = pipeline.run(&source, op.bbox.as_ref())?;
    export_bundle(&bundle, &op.output)?;
    Ok(())
}

//! Worker command implementation.

use crate::config::Config;
use crate::pipeline::ExportPipeline;
use crate::queue::{ExportQueue, LineQueue, Worker, WorkerStats};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};

/// Consumes JSON-line export requests from a file or stdin.
pub struct WorkerCommand {
    config: Config,
    input: Option<PathBuf>,
}

impl WorkerCommand {
    /// Creates a worker command. `None` input means stdin.
    pub fn new(config: Config, input: Option<PathBuf>) -> Self {
        Self { config, input }
    }

    /// Runs until the input is exhausted or Ctrl-C is received.
    pub async fn execute(&self) -> Result<String> {
        let pipeline = ExportPipeline::from_config(&self.config).context("Failed to create HTTP client")?;
        let worker = Worker::new(Arc::new(pipeline), self.config.workers);

        let stats = match &self.input {
            Some(path) => {
                let mut queue = open_spool(path).await?;
                run_until_interrupted(&worker, &mut queue).await
            }
            None => {
                info!("Reading export requests from stdin");
                let mut queue = LineQueue::new(BufReader::new(tokio::io::stdin()));
                run_until_interrupted(&worker, &mut queue).await
            }
        };

        Ok(summary(&stats))
    }
}

async fn open_spool(path: &Path) -> Result<LineQueue<BufReader<tokio::fs::File>>> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open request file: {}", path.display()))?;
    info!("Reading export requests from {}", path.display());
    Ok(LineQueue::new(BufReader::new(file)))
}

async fn run_until_interrupted(worker: &Worker, queue: &mut dyn ExportQueue) -> WorkerStats {
    worker
        .run_until(queue, async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => warn!("Interrupted"),
                Err(e) => {
                    warn!("Cannot listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
}

/// One-line session summary.
pub fn summary(stats: &WorkerStats) -> String {
    format!(
        "{} received, {} completed, {} failed, {} rejected",
        stats.received, stats.completed, stats.failed, stats.rejected
    )
}

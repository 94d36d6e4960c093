//! Export command implementation.

use crate::config::Config;
use crate::findchips::ExportRequest;
use crate::format::Formatter;
use crate::pipeline::{ExportPipeline, RunReport};
use anyhow::{Context, Result};
use tracing::info;

/// Runs the export pipeline directly for one or more part numbers.
pub struct ExportCommand {
    config: Config,
}

/// Printable result of an export command.
#[derive(Debug)]
pub struct ExportOutput {
    pub text: String,
    pub failures: usize,
}

impl ExportCommand {
    /// Creates a new export command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Exports every part and returns formatted output.
    pub async fn execute(&self, part_numbers: &[String]) -> Result<ExportOutput> {
        let pipeline = ExportPipeline::from_config(&self.config).context("Failed to create HTTP client")?;

        Ok(self.execute_with_pipeline(&pipeline, part_numbers).await)
    }

    /// Exports with a provided pipeline (for testing).
    pub async fn execute_with_pipeline(&self, pipeline: &ExportPipeline, part_numbers: &[String]) -> ExportOutput {
        let formatter = Formatter::new(self.config.format);
        let mut sections = Vec::new();
        let mut failures = 0;

        for part_number in part_numbers {
            let report = pipeline.run(&ExportRequest::new(part_number.as_str())).await;
            if !report.is_completed() {
                failures += 1;
            }
            sections.push(self.render(&formatter, &report));
        }

        info!("Exported {} of {} parts", part_numbers.len() - failures, part_numbers.len());

        ExportOutput { text: sections.join("\n\n"), failures }
    }

    fn render(&self, formatter: &Formatter, report: &RunReport) -> String {
        match (&report.export_path, &report.error) {
            (Some(path), _) => format!(
                "{}\n\n{}: {} offers ({} found) -> {}",
                formatter.format_offers(&report.offers),
                report.part_number,
                report.offers.len(),
                report.raw_offers,
                path.display()
            ),
            (None, Some(err)) => match report.failed_during() {
                Some(stage) => format!("{}: export failed while {}: {}", report.part_number, stage, err),
                None => format!("{}: export failed: {}", report.part_number, err),
            },
            (None, None) => format!("{}: no export produced", report.part_number),
        }
    }
}

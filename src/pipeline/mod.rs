//! Export request pipeline: fetch, parse, extract, filter, export.
//!
//! Each run moves strictly forward through [`Stage`] and ends in either
//! `Completed` (exactly one export file written, possibly with no data rows)
//! or `Failed` (nothing written).

use crate::config::Config;
use crate::export::{CsvExporter, ExportError, OfferWriter};
use crate::filters::TopOffers;
use crate::findchips::{ExportRequest, FetchError, FindChipsClient, Offer, PageFetcher, ParseError, Parser};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Pipeline states, in the order a successful run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Received,
    Fetching,
    Parsing,
    Extracting,
    Filtering,
    Exporting,
    Completed,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Completed | Stage::Failed)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Fetching => "fetching",
            Stage::Parsing => "parsing",
            Stage::Extracting => "extracting",
            Stage::Filtering => "filtering",
            Stage::Exporting => "exporting",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Errors that end a run in `Failed`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("part number is empty")]
    EmptyPartNumber,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to parse search page: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Outcome of one pipeline run.
#[derive(Debug)]
pub struct RunReport {
    pub part_number: String,
    /// Every state entered, starting with `Received`.
    pub trace: Vec<Stage>,
    pub raw_offers: usize,
    /// Offers that survived filtering, in export order.
    pub offers: Vec<Offer>,
    pub export_path: Option<PathBuf>,
    pub error: Option<PipelineError>,
}

impl RunReport {
    fn new(part_number: &str) -> Self {
        Self {
            part_number: part_number.to_string(),
            trace: vec![Stage::Received],
            raw_offers: 0,
            offers: Vec::new(),
            export_path: None,
            error: None,
        }
    }

    /// Final state of the run.
    pub fn stage(&self) -> Stage {
        self.trace.last().copied().unwrap_or(Stage::Received)
    }

    pub fn is_completed(&self) -> bool {
        self.stage() == Stage::Completed
    }

    /// The stage that was active when the run failed.
    pub fn failed_during(&self) -> Option<Stage> {
        match self.trace.as_slice() {
            [.., before, Stage::Failed] => Some(*before),
            _ => None,
        }
    }

    fn advance(&mut self, next: Stage) {
        let current = self.stage();
        debug_assert!(!current.is_terminal(), "{} is terminal", current);
        debug_assert!(next > current, "{} -> {} moves backwards", current, next);
        debug!("[{}] {} -> {}", self.part_number, current, next);
        self.trace.push(next);
    }

    fn fail(mut self, err: PipelineError) -> Self {
        error!("[{}] failed while {}: {}", self.part_number, self.stage(), err);
        self.advance(Stage::Failed);
        self.error = Some(err);
        self
    }
}

/// Runs export requests end to end.
///
/// Holds no per-request state, so one pipeline can serve many concurrent runs.
pub struct ExportPipeline {
    fetcher: Arc<dyn PageFetcher>,
    writer: Arc<dyn OfferWriter>,
    parser: Parser,
    filter: TopOffers,
    fetch_timeout: Duration,
}

impl ExportPipeline {
    /// Assembles a pipeline from its collaborators.
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        writer: Arc<dyn OfferWriter>,
        parser: Parser,
        filter: TopOffers,
        fetch_timeout: Duration,
    ) -> Self {
        Self { fetcher, writer, parser, filter, fetch_timeout }
    }

    /// Builds the production pipeline: FindChips client and CSV exporter.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let client = FindChipsClient::new(config)?;

        Ok(Self::new(
            Arc::new(client),
            Arc::new(CsvExporter::new(&config.output_dir)),
            Parser::new(&config.origin),
            TopOffers::new(config.max_distributors, config.max_offers_per_distributor),
            config.fetch_deadline(),
        ))
    }

    /// Processes one request to a terminal state.
    pub async fn run(&self, request: &ExportRequest) -> RunReport {
        let part_number = request.part_number.trim();
        let mut report = RunReport::new(part_number);

        if part_number.is_empty() {
            return report.fail(PipelineError::EmptyPartNumber);
        }

        info!("Starting export for part {}", part_number);

        report.advance(Stage::Fetching);
        let html = match tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(part_number)).await {
            Ok(Ok(html)) => html,
            Ok(Err(e)) => return report.fail(e.into()),
            Err(_) => {
                let err = FetchError::Deadline {
                    part_number: part_number.to_string(),
                    limit: self.fetch_timeout,
                };
                return report.fail(err.into());
            }
        };

        let offers = match self.scrape(&html, &mut report) {
            Ok(offers) => offers,
            Err(e) => return report.fail(e),
        };

        report.advance(Stage::Exporting);
        match self.writer.write(part_number, &offers) {
            Ok(path) => {
                info!("Finished export for {}: {} offers -> {}", part_number, offers.len(), path.display());
                report.export_path = Some(path);
                report.offers = offers;
                report.advance(Stage::Completed);
                report
            }
            Err(e) => report.fail(e.into()),
        }
    }

    /// Parsing, extraction and filtering. The document never outlives this call.
    fn scrape(&self, html: &str, report: &mut RunReport) -> Result<Vec<Offer>, PipelineError> {
        report.advance(Stage::Parsing);
        let document = self.parser.parse_document(html)?;
        let rows = self.parser.locate_rows(&document);

        report.advance(Stage::Extracting);
        let raw = self.parser.extract_all(&rows);
        report.raw_offers = raw.len();
        if raw.is_empty() {
            warn!("No offers found for part {}", report.part_number);
        }

        report.advance(Stage::Filtering);
        Ok(self.filter.apply(raw))
    }
}

//! chips-aggregator - FindChips offer export pipeline
//!
//! Fetches the FindChips search page for a part number, extracts every
//! distributor offer and price break, keeps the top offers per distributor
//! and writes them to a timestamped spreadsheet.

pub mod commands;
pub mod config;
pub mod export;
pub mod filters;
pub mod findchips;
pub mod format;
pub mod pipeline;
pub mod queue;

pub use config::Config;
pub use findchips::{ExportRequest, Offer};
pub use pipeline::{ExportPipeline, RunReport, Stage};

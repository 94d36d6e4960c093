//! FindChips-specific modules for HTTP client, parsing, and data models.

pub mod client;
pub mod fields;
pub mod models;
pub mod parser;
pub mod selectors;
pub mod snapshot;

pub use client::{FetchError, FindChipsClient, PageFetcher};
pub use models::{ExportRequest, Listing, Offer, PriceBreak};
pub use parser::{ParseError, Parser};
pub use snapshot::{safe_file_stem, SnapshotStore};

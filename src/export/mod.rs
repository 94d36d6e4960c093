//! Spreadsheet export of filtered offers.

use crate::findchips::{safe_file_stem, Offer};
use chrono::Local;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

/// Column headers of every export, in order.
pub const HEADERS: [&str; 8] = [
    "Distributor Name",
    "Seller Name",
    "MOQ",
    "SPQ",
    "Unit Price",
    "Currency",
    "Offer URL",
    "Timestamp",
];

/// Timestamp layout used in the `Timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Suffixes tried before giving up on a name clash.
const MAX_NAME_ATTEMPTS: usize = 1000;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Trait for persisting a filtered offer set - enables mocking for tests.
pub trait OfferWriter: Send + Sync {
    /// Writes one artifact holding exactly `offers`, in order, and returns its path.
    fn write(&self, part_number: &str, offers: &[Offer]) -> Result<PathBuf, ExportError>;
}

/// Writes the header and one record per offer to `out`.
pub fn write_csv<W: Write>(out: W, offers: &[Offer]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(HEADERS)?;

    for offer in offers {
        let timestamp = offer.timestamp().format(TIMESTAMP_FORMAT).to_string();
        writer.write_record([
            offer.distributor_name(),
            offer.seller_name(),
            offer.moq(),
            offer.spq(),
            offer.unit_price(),
            offer.currency(),
            offer.offer_url(),
            timestamp.as_str(),
        ])?;
    }

    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes CSV spreadsheets into an output directory.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Candidate names for an export: `Offers_<part>_<timestamp>.csv`, then `_1`, `_2`, ...
    fn candidates(&self, part_number: &str) -> impl Iterator<Item = PathBuf> + '_ {
        let stem = format!(
            "Offers_{}_{}",
            safe_file_stem(part_number),
            Local::now().format("%Y%m%d%H%M%S%3f")
        );

        (0..MAX_NAME_ATTEMPTS).map(move |n| match n {
            0 => self.output_dir.join(format!("{}.csv", stem)),
            n => self.output_dir.join(format!("{}_{}.csv", stem, n)),
        })
    }
}

impl OfferWriter for CsvExporter {
    fn write(&self, part_number: &str, offers: &[Offer]) -> Result<PathBuf, ExportError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| ExportError::Io { path, source }
        };

        std::fs::create_dir_all(&self.output_dir).map_err(io_err(&self.output_dir))?;

        // Dropping the temp file on any early return removes it
        let mut partial = tempfile::Builder::new()
            .prefix(".Offers_")
            .suffix(".partial")
            .tempfile_in(&self.output_dir)
            .map_err(io_err(&self.output_dir))?;
        debug!("Writing {} offers to {}", offers.len(), partial.path().display());

        if let Err(e) = write_csv(partial.as_file_mut(), offers) {
            error!("Export of {} failed: {}", part_number, e);
            return Err(e);
        }

        let mut last = self.output_dir.clone();
        for path in self.candidates(part_number) {
            match partial.persist_noclobber(&path) {
                Ok(_) => {
                    info!("Exported {} offers to {}", offers.len(), path.display());
                    return Ok(path);
                }
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    debug!("{} already exists, trying next name", path.display());
                    partial = e.file;
                    last = path;
                }
                Err(e) => return Err(io_err(&path)(e.error)),
            }
        }

        Err(io_err(&last)(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free export name after {} attempts", MAX_NAME_ATTEMPTS),
        )))
    }
}

//! Raw page snapshots for offline selector debugging.

use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Replaces characters that are not allowed in file names with `_`.
pub fn safe_file_stem(part_number: &str) -> String {
    let stem: String = part_number
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        stem
    }
}

/// Writes fetched pages to a directory, one file per fetch.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Saves `html` for `part_number`. Failures are logged and swallowed.
    pub fn save(&self, part_number: &str, html: &str) -> Option<PathBuf> {
        let file_name = format!(
            "scraped_html_{}_{}.html",
            safe_file_stem(part_number),
            Local::now().format("%Y%m%d%H%M%S%3f")
        );
        let path = self.dir.join(file_name);

        let result = std::fs::create_dir_all(&self.dir).and_then(|_| std::fs::write(&path, html));
        match result {
            Ok(()) => {
                info!("Saved scraped HTML to {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Failed to save scraped HTML for part {}: {}", part_number, e);
                None
            }
        }
    }
}

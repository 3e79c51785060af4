//! CSV persistence for harvested papers.
//!
//! The file is the source of truth between runs: it seeds the existing-key set
//! and is fully rewritten at the end of every harvest.

use crate::dedup::merge_deduplicate;
use crate::error::Result;
use crate::record::{PaperRecord, COLUMNS};
use serde::Deserialize;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Row shape as stored on disk. Every cell is read as a raw string.
#[derive(Debug, Deserialize)]
struct StoredRow {
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: String,
    #[serde(default)]
    year: String,
    #[serde(default)]
    doi: String,
    #[serde(default)]
    ee: String,
    #[serde(rename = "abstract", default)]
    abstract_text: String,
}

impl From<StoredRow> for PaperRecord {
    fn from(row: StoredRow) -> Self {
        PaperRecord {
            title: row.title,
            authors: row.authors,
            year: row.year,
            doi: row.doi,
            ee: row.ee,
            // An empty cell stays an empty string, not `None`.
            abstract_text: Some(row.abstract_text),
        }
    }
}

/// Load previously saved papers.
///
/// Returns an empty list when the file does not exist.
pub fn load_existing(path: &Path) -> Result<Vec<PaperRecord>> {
    if !path.exists() {
        debug!(path = %path.display(), "No existing paper file");
        return Ok(Vec::new());
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut papers = Vec::new();
    for row in rdr.deserialize::<StoredRow>() {
        papers.push(PaperRecord::from(row?));
    }

    info!(path = %path.display(), count = papers.len(), "Loaded existing papers");
    Ok(papers)
}

/// Write `papers` to `path`, replacing any previous content.
pub fn save_all(papers: &[PaperRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    // Header is written explicitly so an empty list still produces it.
    wtr.write_record(COLUMNS)?;
    for paper in papers {
        wtr.write_record(paper.to_row())?;
    }
    wtr.flush()?;

    info!(path = %path.display(), count = papers.len(), "Saved papers");
    Ok(())
}

/// Record counts from an in-place dedup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupReport {
    pub before: usize,
    pub after: usize,
}

impl DedupReport {
    pub fn removed(&self) -> usize {
        self.before - self.after
    }
}

/// Load `path`, merge duplicate records and write the result back.
///
/// # Errors
///
/// Unlike [`load_existing`], a missing file is an error.
pub fn dedup_file(path: &Path) -> Result<DedupReport> {
    if !path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("No such file: {}", path.display()),
        )
        .into());
    }

    let papers = load_existing(path)?;
    let before = papers.len();
    let papers = merge_deduplicate(papers);
    save_all(&papers, path)?;

    Ok(DedupReport {
        before,
        after: papers.len(),
    })
}

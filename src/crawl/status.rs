use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    InProgress,
    Complete,
}

/// What one fetched page contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub page: u32,
    pub digest: String,
    pub segments: usize,
    pub matched: usize,
    pub rejected: usize,
    pub first_mismatch: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StatusFile {
    author: String,
    status: CrawlState,
    pages_fetched: u32,
    records_saved: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_reason: Option<String>,
    #[serde(default)]
    pages: Vec<PageEntry>,
}

/// Persisted per-author crawl progress, `status.json` in the author directory.
pub struct CrawlStatus {
    path: PathBuf,
    file: StatusFile,
}

impl CrawlStatus {
    pub fn new<P: AsRef<Path>>(path: P, author: &str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: StatusFile {
                author: author.to_string(),
                status: CrawlState::InProgress,
                pages_fetched: 0,
                records_saved: 0,
                stop_reason: None,
                pages: Vec::new(),
            },
        }
    }

    /// Loads the status file if present; `Ok(None)` when there is none.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&path)?);
        let file: StatusFile = serde_json::from_reader(reader)?;
        Ok(Some(Self { path, file }))
    }

    pub fn record_page(&mut self, entry: PageEntry) {
        self.file.pages_fetched = self.file.pages_fetched.max(entry.page);
        self.file.records_saved += entry.matched;
        self.file.pages.push(entry);
    }

    pub fn finish(&mut self, stop_reason: &str) {
        self.file.status = CrawlState::Complete;
        self.file.stop_reason = Some(stop_reason.to_string());
    }

    pub fn interrupt(&mut self, stop_reason: &str) {
        self.file.status = CrawlState::InProgress;
        self.file.stop_reason = Some(stop_reason.to_string());
    }

    pub fn is_complete(&self) -> bool {
        self.file.status == CrawlState::Complete
    }

    pub fn state(&self) -> CrawlState {
        self.file.status
    }

    pub fn pages_fetched(&self) -> u32 {
        self.file.pages_fetched
    }

    pub fn records_saved(&self) -> usize {
        self.file.records_saved
    }

    pub fn stop_reason(&self) -> Option<&str> {
        self.file.stop_reason.as_deref()
    }

    pub fn pages(&self) -> &[PageEntry] {
        &self.file.pages
    }

    pub fn last_digest(&self) -> Option<&str> {
        self.file.pages.last().map(|p| p.digest.as_str())
    }

    pub fn save(&self) -> Result<()> {
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.file)?;
        writer.flush()?;
        Ok(())
    }
}

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const UNTITLED_SERMON: &str = "Untitled Sermon";
pub const UNKNOWN_SPEAKER: &str = "Unknown Speaker";
pub const UNKNOWN_DATE: &str = "Unknown Date";

/// Metadata scraped from one sermon detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SermonRecord {
    pub title: String,
    pub speaker: String,
    pub date: String,
    pub mp3_url: Option<String>,
}

/// Result of fetching a sermon detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SermonPage {
    Sermon(SermonRecord),
    /// The page resolved to the site's generic homepage, i.e. a dead or
    /// redirected link.
    NotASermon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadReport {
    pub path: PathBuf,
    pub bytes_written: u64,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

impl DownloadReport {
    pub fn looks_like_audio(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_lowercase().contains("audio"))
    }
}

#[derive(Debug)]
pub enum DownloadOutcome {
    Downloaded(DownloadReport),
    /// Another task in this run already claimed or finished the same title.
    Duplicate,
}

/// What happened to a single discovered URL.
#[derive(Debug)]
pub enum TaskOutcome {
    Downloaded { title: String, report: DownloadReport },
    Duplicate { title: String },
    NotASermon { url: String },
    NoAudio { title: String },
    Failed { url: String, reason: String },
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub discovered: usize,
    pub downloaded: usize,
    pub duplicates: usize,
    pub not_sermons: usize,
    pub no_audio: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Downloaded { .. } => self.downloaded += 1,
            TaskOutcome::Duplicate { .. } => self.duplicates += 1,
            TaskOutcome::NotASermon { .. } => self.not_sermons += 1,
            TaskOutcome::NoAudio { .. } => self.no_audio += 1,
            TaskOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use reqwest::Client;
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
    config::{DispatchMode, SiteConfig},
    discover::SeriesDiscoverer,
    download::SermonDownloader,
    error::{Result, SermonError},
    extract::fetch_sermon,
    http::normalize_url,
    titles::DownloadedTitles,
    types::{BatchSummary, DownloadOutcome, SermonPage, SermonRecord, TaskOutcome},
};

/// Observes the events of a run. Presentation only.
pub trait RunObserver: Send + Sync {
    fn discovery_started(&self, _series_url: &str) {}
    /// Called once discovery succeeded, with the number of sermon pages found.
    fn discovery_finished(&self, _count: usize) {}
    fn sermon_started(&self, _index: usize, _total: usize, _url: &str) {}
    /// Metadata of a sermon page, reported before its audio is requested.
    fn sermon_metadata(&self, _index: usize, _total: usize, _record: &SermonRecord) {}
    fn sermon_finished(&self, _index: usize, _total: usize, _outcome: &TaskOutcome) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct QuietObserver;

impl RunObserver for QuietObserver {}

/// Everything one orchestration run owns: the client, the output directory
/// and the title set shared by the run's tasks.
#[derive(Clone)]
pub struct SeriesRun {
    client: Client,
    site: Arc<SiteConfig>,
    downloader: SermonDownloader,
    output_dir: Arc<PathBuf>,
    titles: DownloadedTitles,
    dispatch: DispatchMode,
    observer: Arc<dyn RunObserver>,
}

impl SeriesRun {
    pub fn new(
        client: Client,
        site: Arc<SiteConfig>,
        downloader: SermonDownloader,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            site,
            downloader,
            output_dir: Arc::new(output_dir.into()),
            titles: DownloadedTitles::new(),
            dispatch: DispatchMode::default(),
            observer: Arc::new(QuietObserver),
        }
    }

    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn titles(&self) -> &DownloadedTitles {
        &self.titles
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Discover a series and download every sermon in it.
    ///
    /// Only an unreachable series page or an unusable output directory is an
    /// error; per-sermon failures are counted in the summary.
    pub async fn run<D: SeriesDiscoverer>(
        &self,
        discoverer: &mut D,
        series_url: &str,
    ) -> Result<BatchSummary> {
        tokio::fs::create_dir_all(self.output_dir.as_path())
            .await
            .map_err(|e| SermonError::filesystem(&self.output_dir, e))?;

        self.observer.discovery_started(series_url);
        let urls = discoverer.discover(series_url).await?;
        tracing::info!(count = urls.len(), "sermons found in the series");
        self.observer.discovery_finished(urls.len());
        if urls.is_empty() {
            return Ok(BatchSummary::default());
        }

        Ok(self.download_all(urls).await)
    }

    /// Process every URL according to the dispatch mode. One URL failing never
    /// stops the others.
    pub async fn download_all(&self, urls: Vec<String>) -> BatchSummary {
        let mut summary = BatchSummary {
            discovered: urls.len(),
            ..BatchSummary::default()
        };

        match self.dispatch {
            DispatchMode::Sequential { delay } => {
                let total = urls.len();
                for (i, url) in urls.into_iter().enumerate() {
                    let outcome = self.process(i + 1, total, url).await;
                    summary.record(&outcome);
                    if i + 1 < total {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
            DispatchMode::Pooled { concurrency } => {
                self.run_pooled(urls, concurrency.max(1), &mut summary).await;
            }
        }

        tracing::info!(
            downloaded = summary.downloaded,
            duplicates = summary.duplicates,
            not_sermons = summary.not_sermons,
            no_audio = summary.no_audio,
            failed = summary.failed,
            "series finished"
        );
        summary
    }

    async fn run_pooled(&self, urls: Vec<String>, concurrency: usize, summary: &mut BatchSummary) {
        let total = urls.len();
        let permits = Arc::new(Semaphore::new(concurrency));
        let mut tasks = JoinSet::new();

        for (i, url) in urls.into_iter().enumerate() {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };
            let run = self.clone();
            tasks.spawn(async move {
                let _permit = permit;
                run.process(i + 1, total, url).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    tracing::error!(error = %e, "sermon task panicked");
                    summary.failed += 1;
                }
            }
        }
    }

    /// Extract then download one sermon page.
    pub async fn process(&self, index: usize, total: usize, url: String) -> TaskOutcome {
        let url = normalize_url(&url);
        self.observer.sermon_started(index, total, &url);
        let outcome = self.process_inner(index, total, &url).await;
        self.observer.sermon_finished(index, total, &outcome);
        outcome
    }

    async fn process_inner(&self, index: usize, total: usize, url: &str) -> TaskOutcome {
        let record = match fetch_sermon(&self.client, url, &self.site).await {
            Ok(SermonPage::Sermon(record)) => record,
            Ok(SermonPage::NotASermon) => {
                tracing::info!(url, "page resolved to the site homepage, skipping");
                return TaskOutcome::NotASermon {
                    url: url.to_string(),
                };
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "could not fetch sermon page");
                return TaskOutcome::Failed {
                    url: url.to_string(),
                    reason: e.to_string(),
                };
            }
        };

        tracing::info!(
            url,
            title = %record.title,
            speaker = %record.speaker,
            date = %record.date,
            mp3_url = record.mp3_url.as_deref().unwrap_or("-"),
            "sermon metadata"
        );
        self.observer.sermon_metadata(index, total, &record);

        if record.mp3_url.is_none() {
            tracing::warn!(url, title = %record.title, "MP3 URL not found, skipping");
            return TaskOutcome::NoAudio {
                title: record.title,
            };
        }

        match self
            .downloader
            .download(&record, Some(url), &self.output_dir, Some(&self.titles))
            .await
        {
            Ok(DownloadOutcome::Downloaded(report)) => TaskOutcome::Downloaded {
                title: record.title,
                report,
            },
            Ok(DownloadOutcome::Duplicate) => TaskOutcome::Duplicate {
                title: record.title,
            },
            Err(e) => TaskOutcome::Failed {
                url: url.to_string(),
                reason: e.to_string(),
            },
        }
    }
}

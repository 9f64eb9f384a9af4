use std::{path::Path, sync::Arc};

use reqwest::{Client, Response, header};
use tokio::{fs, io::AsyncWriteExt};
use url::Url;

use crate::{
    config::{DownloadOptions, parse_url},
    error::{Result, SermonError},
    http::{build_streaming_client, encode_audio_url},
    progress::{NoProgress, ProgressSink, TransferProgress},
    sanitize::sanitize_filename,
    titles::DownloadedTitles,
    types::{DownloadOutcome, DownloadReport, SermonRecord},
};

/// Bytes written to disk per write call.
pub const CHUNK_SIZE: usize = 8 * 1024;

struct HeadInfo {
    content_type: Option<String>,
    content_length: Option<u64>,
}

/// Streams sermon audio into a directory.
#[derive(Clone)]
pub struct SermonDownloader {
    client: Client,
    options: DownloadOptions,
    progress: Arc<dyn ProgressSink>,
}

impl SermonDownloader {
    pub fn new(options: DownloadOptions) -> Result<Self> {
        Ok(Self {
            client: build_streaming_client(&options)?,
            options,
            progress: Arc::new(NoProgress),
        })
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Download `record` into `directory`.
    ///
    /// With `titles`, the title is claimed before any request is made and a
    /// title that is already claimed yields [`DownloadOutcome::Duplicate`]. The
    /// title is recorded as downloaded only after the file is fully written.
    /// `page_url` resolves relative audio sources.
    pub async fn download(
        &self,
        record: &SermonRecord,
        page_url: Option<&str>,
        directory: &Path,
        titles: Option<&DownloadedTitles>,
    ) -> Result<DownloadOutcome> {
        let audio_url = resolve_audio_url(record, page_url)?;

        if let Some(titles) = titles
            && !titles.claim(&record.title)
        {
            tracing::info!(title = %record.title, "already downloaded in this run, skipping");
            return Ok(DownloadOutcome::Duplicate);
        }

        let result = self.transfer(record, &audio_url, directory).await;

        if let Some(titles) = titles {
            match &result {
                Ok(_) => titles.complete(&record.title),
                Err(_) => titles.release(&record.title),
            }
        }

        match result {
            Ok(report) => Ok(DownloadOutcome::Downloaded(report)),
            Err(e) => {
                tracing::warn!(title = %record.title, url = %audio_url, error = %e, "download failed");
                Err(e)
            }
        }
    }

    async fn transfer(
        &self,
        record: &SermonRecord,
        audio_url: &Url,
        directory: &Path,
    ) -> Result<DownloadReport> {
        let url = audio_url.as_str();

        let head = if self.options.check_with_head {
            Some(self.head(url).await?)
        } else {
            None
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SermonError::transport(url, e))?;
        let response = ensure_success(url, response)?;

        let content_type = head
            .as_ref()
            .and_then(|h| h.content_type.clone())
            .or_else(|| header_str(&response, header::CONTENT_TYPE));
        let content_length = head
            .as_ref()
            .and_then(|h| h.content_length)
            .or_else(|| response.content_length());

        if head.is_none() {
            log_size(&record.title, content_length);
        }

        fs::create_dir_all(directory)
            .await
            .map_err(|e| SermonError::filesystem(directory, e))?;
        let path = directory.join(sanitize_filename(&record.title));

        let mut progress = self.progress.begin(&record.title, content_length);
        let written = stream_to_file(url, response, &path, progress.as_mut()).await;
        match &written {
            Ok(_) => progress.finish(),
            Err(_) => progress.abandon(),
        }
        let bytes_written = written?;

        tracing::info!(title = %record.title, path = %path.display(), bytes_written, "downloaded");

        Ok(DownloadReport {
            path,
            bytes_written,
            content_type,
            content_length,
        })
    }

    async fn head(&self, url: &str) -> Result<HeadInfo> {
        let response = self
            .client
            .head(url)
            .timeout(self.options.request_timeout)
            .send()
            .await
            .map_err(|e| SermonError::transport(url, e))?;
        let response = ensure_success(url, response)?;

        let content_type = header_str(&response, header::CONTENT_TYPE);
        let content_length =
            header_str(&response, header::CONTENT_LENGTH).and_then(|v| v.parse::<u64>().ok());

        let ct = content_type.as_deref().unwrap_or("");
        if !ct.to_lowercase().contains("audio") {
            tracing::warn!(url, content_type = ct, "content type is not audio as expected");
        }
        log_size(url, content_length);

        Ok(HeadInfo {
            content_type,
            content_length,
        })
    }
}

/// Audio URL of a record, percent-encoded and resolved against its page.
pub fn resolve_audio_url(record: &SermonRecord, page_url: Option<&str>) -> Result<Url> {
    let Some(src) = record.mp3_url.as_deref() else {
        return Err(SermonError::MissingAudio {
            title: record.title.clone(),
        });
    };
    let encoded = encode_audio_url(src.trim());

    match page_url {
        Some(page) => parse_url(page)?
            .join(&encoded)
            .map_err(|e| SermonError::InvalidUrl {
                url: encoded.clone(),
                reason: e.to_string(),
            }),
        None => parse_url(&encoded),
    }
}

/// Megabytes, as printed in size logs.
pub fn size_in_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

fn log_size(subject: &str, content_length: Option<u64>) {
    match content_length {
        Some(bytes) => tracing::info!(
            subject,
            size_mb = %format!("{:.2}", size_in_mb(bytes)),
            "file size"
        ),
        None => tracing::info!(subject, "file size unknown"),
    }
}

fn ensure_success(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SermonError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

fn header_str(response: &Response, name: header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn stream_to_file(
    url: &str,
    mut response: Response,
    path: &Path,
    progress: &mut dyn TransferProgress,
) -> Result<u64> {
    let mut file = fs::File::create(path)
        .await
        .map_err(|e| SermonError::filesystem(path, e))?;
    let mut written = 0u64;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| SermonError::transport(url, e))?
    {
        for piece in chunk.chunks(CHUNK_SIZE) {
            file.write_all(piece)
                .await
                .map_err(|e| SermonError::filesystem(path, e))?;
            written += piece.len() as u64;
            progress.advance(piece.len() as u64);
        }
    }

    file.flush()
        .await
        .map_err(|e| SermonError::filesystem(path, e))?;
    Ok(written)
}

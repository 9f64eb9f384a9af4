use reqwest::Client;

use crate::{
    config::DownloadOptions,
    error::{Result, SermonError},
};

/// Delimiters left untouched when encoding audio URLs, in addition to the
/// unreserved set and existing `%` escapes.
const URL_SAFE: &[char] = &[':', '/', '?', '&', '=', '%'];

/// Build the HTTP client for pages: discovery, extraction, search and WebDriver.
/// Every request is bounded by `request_timeout` end to end.
pub fn build_client(options: &DownloadOptions) -> Result<Client> {
    Client::builder()
        .user_agent(options.user_agent.as_str())
        .connect_timeout(options.connect_timeout)
        .timeout(options.request_timeout)
        .build()
        .map_err(|e| SermonError::transport("<client>", e))
}

/// Build the HTTP client for audio transfers. There is no total deadline, a
/// transfer only fails once the body stalls for longer than `idle_timeout`.
pub fn build_streaming_client(options: &DownloadOptions) -> Result<Client> {
    Client::builder()
        .user_agent(options.user_agent.as_str())
        .connect_timeout(options.connect_timeout)
        .read_timeout(options.idle_timeout)
        .build()
        .map_err(|e| SermonError::transport("<client>", e))
}

/// Prepend `https://` when the scheme is missing.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("https://") || url.starts_with("http://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Percent-encode an audio URL, keeping the structure of the URL intact.
pub fn encode_audio_url(url: &str) -> String {
    let mut encoded = String::with_capacity(url.len());
    let mut pending = String::new();

    for c in url.chars() {
        if URL_SAFE.contains(&c) {
            encoded.push_str(&urlencoding::encode(&pending));
            pending.clear();
            encoded.push(c);
        } else {
            pending.push(c);
        }
    }
    encoded.push_str(&urlencoding::encode(&pending));
    encoded
}

/// GET a page and return its body, treating non-2xx responses as errors.
pub async fn fetch_html(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SermonError::transport(url, e))?;

    let status = response.status();
    tracing::debug!(url, status = status.as_u16(), "fetched page");
    if !status.is_success() {
        return Err(SermonError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| SermonError::transport(url, e))
}

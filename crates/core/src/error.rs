use std::{path::PathBuf, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SermonError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid selector {selector}: {reason}")]
    Parse { selector: String, reason: String },

    #[error("Cannot write {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Page did not stop growing within {0:?}")]
    RenderTimeout(Duration),

    #[error("Renderer failed: {reason}")]
    Renderer { reason: String },

    #[error("Sermon has no audio URL: {title}")]
    MissingAudio { title: String },
}

impl SermonError {
    pub(crate) fn transport(url: &str, source: reqwest::Error) -> Self {
        SermonError::Transport {
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn filesystem(path: &std::path::Path, source: std::io::Error) -> Self {
        SermonError::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SermonError>;

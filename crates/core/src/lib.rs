//! Sermondl Core Library
//!
//! Discovers the sermons of a SermonAudio series, extracts their metadata from
//! the rendered pages and downloads the audio, plus a small keyword search.

pub mod config;
mod dom;
pub mod discover;
pub mod download;
pub mod error;
pub mod extract;
pub mod http;
pub mod progress;
pub mod renderer;
pub mod sanitize;
pub mod search;
pub mod series;
pub mod titles;
pub mod types;

// Re-export commonly used items at crate root
pub use config::{DispatchMode, DownloadOptions, RenderOptions, SiteConfig};
pub use discover::{RenderedDiscoverer, SeriesDiscoverer, StaticDiscoverer};
pub use download::SermonDownloader;
pub use error::{Result, SermonError};
pub use extract::{fetch_sermon, parse_sermon_page};
pub use http::{build_client, build_streaming_client};
pub use progress::{NoProgress, ProgressSink, TransferProgress};
pub use renderer::{Renderer, WebDriverRenderer};
pub use sanitize::sanitize_filename;
pub use search::SearchClient;
pub use series::{QuietObserver, RunObserver, SeriesRun};
pub use titles::DownloadedTitles;
pub use types::{
    BatchSummary, DownloadOutcome, DownloadReport, SearchResult, SermonPage, SermonRecord,
    TaskOutcome,
};

use std::time::Duration;

use url::Url;

use crate::error::{Result, SermonError};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const DEFAULT_OUTPUT_DIR: &str = "downloaded_sermons";
pub const WEBDRIVER_ENV_VAR: &str = "SERMONDL_WEBDRIVER_URL";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Structural markers and origins of the sermon-hosting site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Origin that series and sermon detail pages live on.
    pub base_url: Url,
    /// Origin of the legacy keyword search.
    pub search_base_url: Url,
    pub search_path: String,
    /// `<title>` of the generic homepage that dead sermon links redirect to.
    pub homepage_title: String,
    /// Attribute stamped on the site's sermon components.
    pub component_marker: String,
    pub filtered_list_key: String,
    pub scroll_list_key: String,
    pub listing_link_class: String,
    pub search_link_class: String,
    pub sermon_path_segment: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://beta.sermonaudio.com").expect("valid default origin"),
            search_base_url: Url::parse("https://www.sermonaudio.com")
                .expect("valid default origin"),
            search_path: "sermons.asp".to_string(),
            homepage_title: "SermonAudio".to_string(),
            component_marker: "data-v-29c0d6dd".to_string(),
            filtered_list_key: "SiteFilteredSermonList:0".to_string(),
            scroll_list_key: "ScrollList:0".to_string(),
            listing_link_class: "sermon-title".to_string(),
            search_link_class: "sermonlink".to_string(),
            sermon_path_segment: "/sermons/".to_string(),
        }
    }
}

impl SiteConfig {
    /// Same markers, different origins. Used to point the scraper at a mirror.
    pub fn with_origins(base_url: &str, search_base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_url(base_url)?,
            search_base_url: parse_url(search_base_url)?,
            ..Self::default()
        })
    }

    /// Resolve an `href` found on a page against the site origin.
    pub fn resolve(&self, href: &str) -> Result<Url> {
        self.base_url
            .join(href)
            .map_err(|e| SermonError::InvalidUrl {
                url: href.to_string(),
                reason: e.to_string(),
            })
    }
}

pub(crate) fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| SermonError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Total deadline for page fetches and the HEAD check.
    pub request_timeout: Duration,
    /// Longest silence tolerated while streaming audio.
    pub idle_timeout: Duration,
    /// Issue a HEAD request first to log content type and size.
    pub check_with_head: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(60),
            check_with_head: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Bounded worker pool; no explicit delay between dispatches.
    Pooled { concurrency: usize },
    /// One sermon at a time with a politeness delay between dispatches.
    Sequential { delay: Duration },
}

impl Default for DispatchMode {
    fn default() -> Self {
        DispatchMode::Pooled { concurrency: 5 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Wait after every scroll before measuring the page height again.
    pub settle: Duration,
    /// Wall-clock bound on the whole scroll loop. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(1),
            timeout: Some(Duration::from_secs(300)),
        }
    }
}

/// WebDriver endpoint from the environment, falling back to a local chromedriver.
pub fn webdriver_url_from_env() -> String {
    std::env::var(WEBDRIVER_ENV_VAR).unwrap_or_else(|_| DEFAULT_WEBDRIVER_URL.to_string())
}

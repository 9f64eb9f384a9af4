use std::sync::Arc;

use reqwest::Client;
use scraper::Html;
use url::Url;

use crate::{
    config::SiteConfig,
    dom::{selector, text_of},
    error::{Result, SermonError},
    http::fetch_html,
    types::SearchResult,
};

/// Result page requested when the caller names none.
pub const FIRST_PAGE: u32 = 1;

/// One-shot keyword search against the site's legacy search page.
pub struct SearchClient {
    client: Client,
    site: Arc<SiteConfig>,
}

impl SearchClient {
    pub fn new(client: Client, site: Arc<SiteConfig>) -> Self {
        Self { client, site }
    }

    pub fn search_url(&self, query: &str, page: Option<u32>) -> Result<Url> {
        let mut url = self
            .site
            .search_base_url
            .join(&self.site.search_path)
            .map_err(|e| SermonError::InvalidUrl {
                url: self.site.search_path.clone(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("currpage", &page.unwrap_or(FIRST_PAGE).to_string());
            pairs.append_pair("keyword", query);
        }
        Ok(url)
    }

    /// Results on the requested page, in document order. Failures are logged
    /// and yield an empty list.
    pub async fn search(&self, query: &str, page: Option<u32>) -> Vec<SearchResult> {
        match self.try_search(query, page).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(query, error = %e, "search failed");
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &str, page: Option<u32>) -> Result<Vec<SearchResult>> {
        let url = self.search_url(query, page)?;
        tracing::info!(url = %url, "searching");
        let body = fetch_html(&self.client, url.as_str()).await?;
        parse_search_results(&body, &self.site)
    }
}

/// `{title, url}` for every search-result link in the document.
pub fn parse_search_results(html: &str, site: &SiteConfig) -> Result<Vec<SearchResult>> {
    let doc = Html::parse_document(html);
    let sel = selector(&format!("a.{}", site.search_link_class))?;

    let mut results = Vec::new();
    for link in doc.select(&sel) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let url = match site.search_base_url.join(href) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::warn!(href, error = %e, "skipping unresolvable search result");
                continue;
            }
        };
        results.push(SearchResult {
            title: text_of(link),
            url,
        });
    }
    Ok(results)
}

use std::{collections::HashSet, sync::Arc, time::Duration};

use reqwest::Client;
use scraper::Html;

use crate::{
    config::{RenderOptions, SiteConfig},
    dom::selector,
    error::{Result, SermonError},
    http::{fetch_html, normalize_url},
    renderer::Renderer,
};

pub const PAGE_HEIGHT_SCRIPT: &str = "return document.body.scrollHeight;";
pub const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Enumerates the sermon detail pages reachable from a series landing page.
///
/// `Err` means the series page could not be reached at all. Anything short of
/// that (missing markup, a page that never settles) yields an empty list.
pub trait SeriesDiscoverer {
    async fn discover(&mut self, series_url: &str) -> Result<Vec<String>>;
}

fn push_unique(urls: &mut Vec<String>, seen: &mut HashSet<String>, url: String) {
    if seen.insert(url.clone()) {
        tracing::debug!(url = %url, "found sermon URL");
        urls.push(url);
    }
}

/// Static scraping of the server-rendered listing.
pub struct StaticDiscoverer {
    client: Client,
    site: Arc<SiteConfig>,
}

impl StaticDiscoverer {
    pub fn new(client: Client, site: Arc<SiteConfig>) -> Self {
        Self { client, site }
    }
}

impl SeriesDiscoverer for StaticDiscoverer {
    async fn discover(&mut self, series_url: &str) -> Result<Vec<String>> {
        let url = normalize_url(series_url);
        tracing::info!(url = %url, "fetching series page");
        let body = fetch_html(&self.client, &url).await?;
        let urls = parse_series_listing(&body, &self.site)?;
        tracing::info!(count = urls.len(), "sermon URLs found");
        Ok(urls)
    }
}

/// Walk outer component → filtered sermon list → scroll list, then collect the
/// listing links inside the innermost container.
pub fn parse_series_listing(html: &str, site: &SiteConfig) -> Result<Vec<String>> {
    let doc = Html::parse_document(html);

    let outer_sel = selector(&format!("div[{}]", site.component_marker))?;
    let Some(outer) = doc.select(&outer_sel).next() else {
        tracing::warn!(marker = %site.component_marker, "could not find outer component container");
        return Ok(Vec::new());
    };
    tracing::debug!("found outer component container");

    let filtered_sel = selector(&format!(r#"div[data-fetch-key="{}"]"#, site.filtered_list_key))?;
    let Some(filtered) = outer.select(&filtered_sel).next() else {
        tracing::warn!(key = %site.filtered_list_key, "could not find filtered sermon list");
        return Ok(Vec::new());
    };
    tracing::debug!(key = %site.filtered_list_key, "found filtered sermon list");

    let scroll_sel = selector(&format!(r#"div[data-fetch-key="{}"]"#, site.scroll_list_key))?;
    let Some(scroll) = filtered.select(&scroll_sel).next() else {
        tracing::warn!(key = %site.scroll_list_key, "could not find scroll list");
        return Ok(Vec::new());
    };
    tracing::debug!(key = %site.scroll_list_key, "found scroll list");

    let link_sel = selector(&format!("a.{}[href]", site.listing_link_class))?;
    let mut urls = Vec::new();
    let mut seen = HashSet::new();
    for link in scroll.select(&link_sel) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        match site.resolve(href) {
            Ok(url) => push_unique(&mut urls, &mut seen, url.to_string()),
            Err(e) => tracing::warn!(href, error = %e, "skipping unresolvable link"),
        }
    }
    Ok(urls)
}

/// Every link whose `href` contains the sermon path segment, resolved and
/// deduplicated by exact URL.
pub fn collect_sermon_links(html: &str, site: &SiteConfig) -> Result<Vec<String>> {
    let doc = Html::parse_document(html);
    let sel = selector("a[href]")?;

    let mut urls = Vec::new();
    let mut seen = HashSet::new();
    for link in doc.select(&sel) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.contains(site.sermon_path_segment.as_str()) {
            continue;
        }
        match site.resolve(href) {
            Ok(url) => push_unique(&mut urls, &mut seen, url.to_string()),
            Err(e) => tracing::warn!(href, error = %e, "skipping unresolvable link"),
        }
    }
    Ok(urls)
}

async fn page_height<R: Renderer>(renderer: &mut R) -> Result<u64> {
    let value = renderer.evaluate(PAGE_HEIGHT_SCRIPT).await?;
    value
        .as_u64()
        .or_else(|| value.as_f64().map(|h| h as u64))
        .ok_or_else(|| SermonError::Renderer {
            reason: format!("page height is not a number: {}", value),
        })
}

/// Scroll to the bottom until two consecutive height measurements agree.
///
/// There is no cap on the number of scrolls. Returns how many scrolls were
/// issued.
pub async fn scroll_until_stable<R: Renderer>(renderer: &mut R, settle: Duration) -> Result<usize> {
    let mut last = page_height(renderer).await?;
    let mut scrolls = 0;

    loop {
        renderer.evaluate(SCROLL_SCRIPT).await?;
        scrolls += 1;
        tokio::time::sleep(settle).await;

        let height = page_height(renderer).await?;
        tracing::debug!(scrolls, height, "scrolled");
        if height == last {
            return Ok(scrolls);
        }
        last = height;
    }
}

/// Scroll-driven discovery for listings that load lazily in the browser.
pub struct RenderedDiscoverer<R> {
    renderer: R,
    site: Arc<SiteConfig>,
    options: RenderOptions,
}

impl<R: Renderer> RenderedDiscoverer<R> {
    pub fn new(renderer: R, site: Arc<SiteConfig>, options: RenderOptions) -> Self {
        Self {
            renderer,
            site,
            options,
        }
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    async fn render(&mut self) -> Result<String> {
        let settle = self.options.settle;
        let scrolled = match self.options.timeout {
            Some(limit) => {
                tokio::time::timeout(limit, scroll_until_stable(&mut self.renderer, settle))
                    .await
                    .map_err(|_| SermonError::RenderTimeout(limit))??
            }
            None => scroll_until_stable(&mut self.renderer, settle).await?,
        };
        tracing::info!(scrolls = scrolled, "page height stabilized");
        self.renderer.current_html().await
    }

    async fn close_renderer(&mut self) {
        if let Err(e) = self.renderer.close().await {
            tracing::warn!(error = %e, "failed to close renderer");
        }
    }
}

impl<R: Renderer> SeriesDiscoverer for RenderedDiscoverer<R> {
    async fn discover(&mut self, series_url: &str) -> Result<Vec<String>> {
        let url = normalize_url(series_url);
        tracing::info!(url = %url, "rendering series page");

        if let Err(e) = self.renderer.open(&url).await {
            self.close_renderer().await;
            return Err(e);
        }

        let rendered = self.render().await;
        self.close_renderer().await;

        let html = match rendered {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "rendering failed, no sermons discovered");
                return Ok(Vec::new());
            }
        };

        let urls = collect_sermon_links(&html, &self.site)?;
        tracing::info!(count = urls.len(), "sermon URLs found");
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use serde_json::{Value, json};

    use super::*;

    #[derive(Default)]
    struct ScriptedRenderer {
        heights: VecDeque<u64>,
        html: String,
        scrolls: usize,
        opened: Option<String>,
        closed: bool,
        fail_open: bool,
        endless: bool,
    }

    impl ScriptedRenderer {
        fn new(heights: &[u64], html: &str) -> Self {
            Self {
                heights: heights.iter().copied().collect(),
                html: html.to_string(),
                ..Self::default()
            }
        }
    }

    impl Renderer for ScriptedRenderer {
        async fn open(&mut self, url: &str) -> Result<()> {
            if self.fail_open {
                return Err(SermonError::Renderer {
                    reason: "unreachable".into(),
                });
            }
            self.opened = Some(url.to_string());
            Ok(())
        }

        async fn evaluate(&mut self, script: &str) -> Result<Value> {
            if script == SCROLL_SCRIPT {
                self.scrolls += 1;
                return Ok(Value::Null);
            }
            if self.endless {
                return Ok(json!(1000 + self.scrolls * 100));
            }
            // Keep repeating the last height once the script runs out.
            let height = if self.heights.len() > 1 {
                self.heights.pop_front()
            } else {
                self.heights.front().copied()
            };
            Ok(height.map(|h| json!(h)).unwrap_or(Value::Null))
        }

        async fn current_html(&mut self) -> Result<String> {
            Ok(self.html.clone())
        }

        async fn close(&mut self) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    const LISTING: &str = r#"
        <html><body>
          <div data-v-29c0d6dd class="page">
            <div data-fetch-key="SiteFilteredSermonList:0">
              <div data-fetch-key="ScrollList:0">
                <a class="sermon-title" href="/sermons/101">One</a>
                <a class="sermon-title other" href="/sermons/102">Two</a>
                <a class="speaker-link" href="/speakers/7">Speaker</a>
              </div>
            </div>
          </div>
        </body></html>"#;

    #[test]
    fn static_listing_collects_links_in_the_scroll_list() {
        let urls = parse_series_listing(LISTING, &SiteConfig::default()).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://beta.sermonaudio.com/sermons/101",
                "https://beta.sermonaudio.com/sermons/102",
            ]
        );
    }

    #[test]
    fn static_listing_without_containers_is_empty() {
        let site = SiteConfig::default();
        assert!(parse_series_listing("<html><body></body></html>", &site).unwrap().is_empty());

        let no_scroll = r#"<div data-v-29c0d6dd><div data-fetch-key="SiteFilteredSermonList:0">
            <a class="sermon-title" href="/sermons/1">x</a></div></div>"#;
        assert!(parse_series_listing(no_scroll, &site).unwrap().is_empty());

        let no_filtered = r#"<div data-v-29c0d6dd><div data-fetch-key="ScrollList:0">
            <a class="sermon-title" href="/sermons/1">x</a></div></div>"#;
        assert!(parse_series_listing(no_filtered, &site).unwrap().is_empty());
    }

    #[test]
    fn rendered_links_are_filtered_and_deduplicated() {
        let html = r#"
            <a href="/sermons/1">a</a>
            <a href="/series/55">series</a>
            <a href="https://beta.sermonaudio.com/sermons/1">dup</a>
            <a href="/sermons/2?x=1">b</a>
            <a>no href</a>"#;
        let urls = collect_sermon_links(html, &SiteConfig::default()).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://beta.sermonaudio.com/sermons/1",
                "https://beta.sermonaudio.com/sermons/2?x=1",
            ]
        );
    }

    #[tokio::test]
    async fn scrolling_stops_when_height_repeats() {
        let mut renderer = ScriptedRenderer::new(&[100, 500, 900, 900], "");
        let scrolls = scroll_until_stable(&mut renderer, Duration::ZERO).await.unwrap();
        assert_eq!(scrolls, 3);
        assert_eq!(renderer.scrolls, 3);
    }

    #[tokio::test]
    async fn already_stable_page_scrolls_once() {
        let mut renderer = ScriptedRenderer::new(&[700, 700], "");
        let scrolls = scroll_until_stable(&mut renderer, Duration::ZERO).await.unwrap();
        assert_eq!(scrolls, 1);
    }

    #[tokio::test]
    async fn non_numeric_height_is_a_renderer_error() {
        let mut renderer = ScriptedRenderer::new(&[], "");
        let err = scroll_until_stable(&mut renderer, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, SermonError::Renderer { .. }));
    }

    #[tokio::test]
    async fn rendered_discovery_collects_and_closes() {
        let renderer = ScriptedRenderer::new(
            &[100, 300, 300],
            r#"<a href="/sermons/9">nine</a><a href="/sermons/10">ten</a>"#,
        );
        let options = RenderOptions {
            settle: Duration::ZERO,
            timeout: None,
        };
        let mut discoverer =
            RenderedDiscoverer::new(renderer, Arc::new(SiteConfig::default()), options);

        let urls = discoverer.discover("beta.sermonaudio.com/series/1").await.unwrap();
        assert_eq!(urls.len(), 2);

        let renderer = discoverer.into_renderer();
        assert_eq!(
            renderer.opened.as_deref(),
            Some("https://beta.sermonaudio.com/series/1")
        );
        assert_eq!(renderer.scrolls, 2);
        assert!(renderer.closed);
    }

    #[tokio::test]
    async fn render_failure_degrades_to_empty() {
        let renderer = ScriptedRenderer::new(&[], "<a href=\"/sermons/1\">x</a>");
        let mut discoverer = RenderedDiscoverer::new(
            renderer,
            Arc::new(SiteConfig::default()),
            RenderOptions {
                settle: Duration::ZERO,
                timeout: None,
            },
        );
        assert!(discoverer.discover("https://x.test/series/1").await.unwrap().is_empty());
        assert!(discoverer.into_renderer().closed);
    }

    #[tokio::test]
    async fn endless_page_hits_the_render_timeout() {
        let mut renderer = ScriptedRenderer::new(&[], "");
        renderer.endless = true;
        let options = RenderOptions {
            settle: Duration::from_millis(5),
            timeout: Some(Duration::from_millis(60)),
        };
        let mut discoverer =
            RenderedDiscoverer::new(renderer, Arc::new(SiteConfig::default()), options);

        let err = discoverer.render().await.unwrap_err();
        assert!(matches!(err, SermonError::RenderTimeout(_)));
        assert!(discoverer.discover("https://x.test/series/1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_series_page_is_fatal() {
        let mut renderer = ScriptedRenderer::new(&[1], "");
        renderer.fail_open = true;
        let mut discoverer = RenderedDiscoverer::new(
            renderer,
            Arc::new(SiteConfig::default()),
            RenderOptions::default(),
        );
        assert!(discoverer.discover("https://x.test/series/1").await.is_err());
        assert!(discoverer.into_renderer().closed);
    }
}

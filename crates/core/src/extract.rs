use reqwest::Client;
use scraper::Html;

use crate::{
    config::SiteConfig,
    dom::{marked_class, non_empty, selector, text_of},
    error::Result,
    http::{fetch_html, normalize_url},
    types::{SermonPage, SermonRecord, UNKNOWN_DATE, UNKNOWN_SPEAKER, UNTITLED_SERMON},
};

type TitleSource = fn(&Html, &SiteConfig) -> Result<Option<String>>;

/// Title sources in priority order; the first non-empty one wins.
const TITLE_SOURCES: [TitleSource; 5] = [
    component_title,
    og_title,
    document_title,
    first_heading,
    any_title_class,
];

fn component_title(doc: &Html, site: &SiteConfig) -> Result<Option<String>> {
    let sel = marked_class(&site.component_marker, "title")?;
    Ok(doc.select(&sel).next().map(text_of).and_then(non_empty))
}

fn og_title(doc: &Html, _site: &SiteConfig) -> Result<Option<String>> {
    let sel = selector(r#"meta[property="og:title"]"#)?;
    Ok(doc
        .select(&sel)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .and_then(non_empty))
}

fn document_title(doc: &Html, _site: &SiteConfig) -> Result<Option<String>> {
    let sel = selector("title")?;
    Ok(doc.select(&sel).next().map(text_of).and_then(non_empty))
}

fn first_heading(doc: &Html, _site: &SiteConfig) -> Result<Option<String>> {
    let sel = selector("h1")?;
    Ok(doc.select(&sel).next().map(text_of).and_then(non_empty))
}

fn any_title_class(doc: &Html, _site: &SiteConfig) -> Result<Option<String>> {
    let sel = selector("[class]")?;
    Ok(doc
        .select(&sel)
        .find(|el| {
            el.value()
                .classes()
                .any(|class| class.to_lowercase().contains("title"))
        })
        .map(text_of)
        .and_then(non_empty))
}

fn marked_text(doc: &Html, site: &SiteConfig, class: &str) -> Result<Option<String>> {
    let sel = marked_class(&site.component_marker, class)?;
    Ok(doc.select(&sel).next().map(text_of))
}

/// Resolve a sermon record from a rendered detail page.
pub fn parse_sermon_page(html: &str, site: &SiteConfig) -> Result<SermonPage> {
    let doc = Html::parse_document(html);

    let mut title = None;
    for source in TITLE_SOURCES {
        if let Some(found) = source(&doc, site)? {
            title = Some(found);
            break;
        }
    }
    let title = title.unwrap_or_else(|| UNTITLED_SERMON.to_string());

    if title.to_lowercase() == site.homepage_title.to_lowercase() {
        return Ok(SermonPage::NotASermon);
    }

    let speaker =
        marked_text(&doc, site, "speaker")?.unwrap_or_else(|| UNKNOWN_SPEAKER.to_string());
    let date = marked_text(&doc, site, "date")?.unwrap_or_else(|| UNKNOWN_DATE.to_string());

    let audio = selector("audio")?;
    let mp3_url = doc
        .select(&audio)
        .next()
        .and_then(|el| el.value().attr("src"))
        .map(str::to_string);

    Ok(SermonPage::Sermon(SermonRecord {
        title,
        speaker,
        date,
        mp3_url,
    }))
}

/// Fetch a sermon detail page and extract its metadata.
pub async fn fetch_sermon(client: &Client, url: &str, site: &SiteConfig) -> Result<SermonPage> {
    let url = normalize_url(url);
    let body = fetch_html(client, &url).await?;
    parse_sermon_page(&body, site)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sermon(html: &str) -> SermonRecord {
        match parse_sermon_page(html, &SiteConfig::default()).unwrap() {
            SermonPage::Sermon(record) => record,
            SermonPage::NotASermon => panic!("expected a sermon page"),
        }
    }

    const FULL_PAGE: &str = r#"
        <html><head>
          <title>Ignored Document Title</title>
          <meta property="og:title" content="Ignored OG Title">
        </head><body>
          <div data-v-29c0d6dd class="header">
            <h2 data-v-29c0d6dd class="title"> The Sovereignty of God </h2>
            <span data-v-29c0d6dd class="speaker">A. W. Pink</span>
            <span data-v-29c0d6dd class="date">Jan 5, 1930</span>
          </div>
          <audio src="https://media.example.com/sermons/sovereignty.mp3"></audio>
          <audio src="https://media.example.com/sermons/second.mp3"></audio>
        </body></html>"#;

    #[test]
    fn extracts_all_fields_from_component_markup() {
        let record = sermon(FULL_PAGE);
        assert_eq!(record.title, "The Sovereignty of God");
        assert_eq!(record.speaker, "A. W. Pink");
        assert_eq!(record.date, "Jan 5, 1930");
        assert_eq!(
            record.mp3_url.as_deref(),
            Some("https://media.example.com/sermons/sovereignty.mp3")
        );
    }

    #[test]
    fn og_title_beats_document_title() {
        let record = sermon(
            r#"<html><head><title>Doc</title><meta property="og:title" content="Open Graph"></head></html>"#,
        );
        assert_eq!(record.title, "Open Graph");
    }

    #[test]
    fn falls_back_to_document_title() {
        let record = sermon("<html><head><title>Evening Service</title></head><body></body></html>");
        assert_eq!(record.title, "Evening Service");
        assert_eq!(record.speaker, "Unknown Speaker");
        assert_eq!(record.date, "Unknown Date");
        assert_eq!(record.mp3_url, None);
    }

    #[test]
    fn falls_back_to_first_heading() {
        let record = sermon("<body><h1>First</h1><h1>Second</h1></body>");
        assert_eq!(record.title, "First");
    }

    #[test]
    fn falls_back_to_any_title_like_class() {
        let record = sermon(r#"<body><div class="card"><p class="SermonTitle-main">From Class</p></div></body>"#);
        assert_eq!(record.title, "From Class");
    }

    #[test]
    fn empty_candidates_are_skipped() {
        let record = sermon("<html><head><title>  </title></head><body><h1>Heading</h1></body></html>");
        assert_eq!(record.title, "Heading");
    }

    #[test]
    fn untitled_when_nothing_matches() {
        let record = sermon("<html><body><p>No headings here</p></body></html>");
        assert_eq!(record.title, "Untitled Sermon");
    }

    #[test]
    fn speaker_without_marker_is_unknown() {
        let record = sermon(r#"<title>T</title><span class="speaker">Unmarked</span>"#);
        assert_eq!(record.speaker, "Unknown Speaker");
    }

    #[test]
    fn homepage_title_signals_dead_link() {
        let page = parse_sermon_page(
            "<html><head><title>sermonaudio</title></head></html>",
            &SiteConfig::default(),
        )
        .unwrap();
        assert_eq!(page, SermonPage::NotASermon);

        let page = parse_sermon_page(
            "<html><head><title>SermonAudio Sermons</title></head></html>",
            &SiteConfig::default(),
        )
        .unwrap();
        assert!(matches!(page, SermonPage::Sermon(_)));
    }
}

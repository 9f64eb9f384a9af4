use scraper::{ElementRef, Selector};

use crate::error::{Result, SermonError};

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| SermonError::Parse {
        selector: css.to_string(),
        reason: format!("{:?}", e),
    })
}

/// Trimmed text content of an element.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// `[marker].class`, the shape of the site's scoped component markup.
pub(crate) fn marked_class(marker: &str, class: &str) -> Result<Selector> {
    selector(&format!("[{}].{}", marker, class))
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

use scraper::{Html, Selector};
use std::sync::OnceLock;

/// Extracts the full description text from a job detail page.
///
/// Returns `None` when the container is absent or holds no text, which the
/// fetcher treats as "content not available yet".
pub fn extract_description(html: &str) -> Option<String> {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("div#jobDescriptionText").unwrap());

    let document = Html::parse_document(html);
    let container = document.select(selector).next()?;
    let text = collapse_whitespace(container.text());

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Joins text nodes with single spaces, dropping runs of whitespace.
pub fn collapse_whitespace<'a>(pieces: impl Iterator<Item = &'a str>) -> String {
    pieces
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

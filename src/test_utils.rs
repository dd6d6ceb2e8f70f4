//! Deterministic stand-ins for the external collaborators, shared by unit
//! tests and the integration tests under `tests/`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use url::Url;

use crate::domain::{RawCard, Verdict};
use crate::extractor::ListingExtractor;
use crate::service::page_source::PageSource;
use crate::service::scorer::RelevanceScorer;

/// Scorer returning a fixed verdict, optionally overridden per title.
pub struct FixedScorer {
    default: Option<Verdict>,
    by_title: HashMap<String, Option<Verdict>>,
    calls: AtomicUsize,
}

impl FixedScorer {
    pub fn new(default: Option<Verdict>) -> Self {
        Self {
            default,
            by_title: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_title(mut self, title: &str, verdict: Option<Verdict>) -> Self {
        self.by_title.insert(title.to_string(), verdict);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelevanceScorer for FixedScorer {
    async fn score(&self, title: &str, _company: &str, _description: &str) -> Option<Verdict> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.by_title
            .get(title)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

/// Page source serving canned result pages, indexed by `offset / page_size`.
/// Offsets past the last page yield empty markup.
pub struct StaticPageSource {
    base: Url,
    page_size: u32,
    pages: Vec<String>,
    failing_offsets: Vec<u32>,
    requested: Mutex<Vec<u32>>,
}

impl StaticPageSource {
    pub fn new(base: &str, page_size: u32, pages: Vec<String>) -> Self {
        Self {
            base: Url::parse(base).expect("valid base url"),
            page_size,
            pages,
            failing_offsets: Vec::new(),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Makes `get_page` fail for the given offset.
    pub fn failing_at(mut self, offset: u32) -> Self {
        self.failing_offsets.push(offset);
        self
    }

    /// Offsets requested so far, in order.
    pub fn requested_offsets(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for StaticPageSource {
    async fn get_page(&self, _query: &str, _location: &str, offset: u32) -> anyhow::Result<String> {
        self.requested.lock().unwrap().push(offset);
        if self.failing_offsets.contains(&offset) {
            anyhow::bail!("page at offset {} unavailable", offset);
        }
        let index = (offset / self.page_size.max(1)) as usize;
        Ok(self.pages.get(index).cloned().unwrap_or_default())
    }

    fn parse_cards(&self, markup: &str) -> Vec<RawCard> {
        ListingExtractor::extract_cards(markup, &self.base)
            .into_iter()
            .map(|card| card.into_value())
            .collect()
    }
}

/// Markup for one listing card in the results-page layout.
pub fn card_html(title: &str, href: &str, company: &str) -> String {
    let href = href.replace('&', "&amp;");
    format!(
        r#"<div class="job_seen_beacon">
            <h2 class="jobTitle"><a href="{href}"><span>{title}</span></a></h2>
            <span data-testid="company-name">{company}</span>
            <div data-testid="text-location"><span>Remote</span></div>
            <ul class="metadataContainer"><li>Full-time</li></ul>
        </div>"#
    )
}

/// Results page wrapping the given cards.
pub fn results_page(cards: &[String]) -> String {
    format!("<html><body><div id=\"results\">{}</div></body></html>", cards.join("\n"))
}

/// Detail page with a description container.
pub fn detail_html(description: &str) -> String {
    format!(
        "<html><body><div id=\"jobDescriptionText\"><p>{}</p></div></body></html>",
        description
    )
}

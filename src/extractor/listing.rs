use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

use crate::domain::{Extraction, RawCard};
use crate::extractor::description::collapse_whitespace;

macro_rules! cached_selector {
    ($css:expr) => {{
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        SELECTOR.get_or_init(|| Selector::parse($css).unwrap())
    }};
}

/// Parses job cards out of a search results page.
pub struct ListingExtractor;

impl ListingExtractor {
    /// Returns one entry per card found, in page order.
    ///
    /// Cards missing some sub-elements come back `Degraded` with empty strings
    /// in those fields; they are never dropped.
    pub fn extract_cards(html: &str, base_url: &Url) -> Vec<Extraction<RawCard>> {
        let document = Html::parse_document(html);
        let cards = cached_selector!("div.job_seen_beacon, div.slider_item");

        document
            .select(cards)
            .map(|card| Self::extract_card(card, base_url))
            .collect()
    }

    pub fn extract_card(card: ElementRef<'_>, base_url: &Url) -> Extraction<RawCard> {
        let mut missing = Vec::new();

        let mut field = |name: &'static str, value: Option<String>| {
            value.unwrap_or_else(|| {
                missing.push(name);
                String::new()
            })
        };

        let raw = RawCard {
            title: field("title", Self::text_of(card, cached_selector!("h2.jobTitle span"))),
            link: field("link", Self::link_of(card, base_url)),
            company: field(
                "company",
                Self::text_of(card, cached_selector!(r#"span[data-testid="company-name"]"#)),
            ),
            location: field(
                "location",
                Self::text_of(card, cached_selector!(r#"div[data-testid="text-location"] span"#)),
            ),
            salary: field("salary", Self::text_of(card, cached_selector!("div.css-1a6kja7 span"))),
            snippet: field("snippet", Self::text_of(card, cached_selector!("ul.metadataContainer"))),
        };

        if missing.is_empty() {
            Extraction::Ok(raw)
        } else {
            Extraction::degraded(raw, format!("missing {}", missing.join(", ")))
        }
    }

    fn text_of(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
        card.select(selector)
            .next()
            .map(|el| collapse_whitespace(el.text()))
            .filter(|s| !s.is_empty())
    }

    fn link_of(card: ElementRef<'_>, base_url: &Url) -> Option<String> {
        let href = card
            .select(cached_selector!("h2.jobTitle a"))
            .next()?
            .value()
            .attr("href")?
            .trim();
        if href.is_empty() {
            return None;
        }
        base_url.join(href).map(|u| u.to_string()).ok()
    }
}

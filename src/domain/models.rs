//! Domain entities flowing through the harvest pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ====== Extraction results ======

/// Result of a best-effort extraction.
///
/// `Degraded` carries the value the pipeline continues with (usually the
/// input unchanged or an empty string) and why the clean path was not taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction<T> {
    Ok(T),
    Degraded { value: T, reason: String },
}

impl<T> Extraction<T> {
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Self::Degraded {
            value,
            reason: reason.into(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Ok(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Ok(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Ok(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }
}

// ====== Listing cards ======

/// One listing card as parsed from a results page.
///
/// Every field is an empty string when the card did not carry it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCard {
    pub title: String,
    pub link: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub snippet: String,
}

// ====== Job record ======

/// A harvested job posting.
///
/// Field order is the column order of the exported table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub short_description: String,
    pub full_description: String,
    /// Link exactly as it appeared on the listing page
    pub link: String,
    /// Identity used for caching and dedup
    pub canonical_link: String,
    pub source: String,
    pub published_date: NaiveDate,
    pub score: Option<f64>,
    pub reason: Option<String>,
}

impl JobRecord {
    /// Builds a record from a card. The description is filled in later by the fetcher.
    pub fn from_card(
        card: RawCard,
        canonical_link: String,
        source: &str,
        published_date: NaiveDate,
    ) -> Self {
        Self {
            title: card.title,
            company: card.company,
            location: card.location,
            salary: card.salary,
            short_description: card.snippet,
            full_description: String::new(),
            link: card.link,
            canonical_link,
            source: source.to_string(),
            published_date,
            score: None,
            reason: None,
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.score.is_some()
    }
}

// ====== Scoring ======

/// Judgment returned by a relevance scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub score: f64,
    pub reason: String,
}

impl Verdict {
    pub fn new(score: f64, reason: impl Into<String>) -> Self {
        Self {
            score,
            reason: reason.into(),
        }
    }
}

// ====== Authentication ======

/// A single cookie from the cookie jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_accessors() {
        let ok: Extraction<String> = Extraction::Ok("a".into());
        assert!(!ok.is_degraded());
        assert_eq!(ok.reason(), None);
        assert_eq!(ok.value(), "a");

        let degraded = Extraction::degraded(String::new(), "title missing");
        assert!(degraded.is_degraded());
        assert_eq!(degraded.reason(), Some("title missing"));
        assert_eq!(degraded.into_value(), "");
    }

    #[test]
    fn test_record_from_card_maps_snippet_and_leaves_scoring_empty() {
        let card = RawCard {
            title: "Marketing Manager".into(),
            link: "https://x/?jk=1".into(),
            snippet: "Full-time".into(),
            ..Default::default()
        };
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let job = JobRecord::from_card(card, "https://s/viewjob?jk=1".into(), "Indeed", date);

        assert_eq!(job.short_description, "Full-time");
        assert_eq!(job.full_description, "");
        assert_eq!(job.link, "https://x/?jk=1");
        assert_eq!(job.canonical_link, "https://s/viewjob?jk=1");
        assert!(!job.is_qualified());
    }
}

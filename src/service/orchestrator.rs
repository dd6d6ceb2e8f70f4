//! Listing traversal: pages → cards → records with full descriptions.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

use crate::config::{HarvestSettings, PolitenessDelay};
use crate::domain::JobRecord;
use crate::service::auth::AuthContext;
use crate::service::cache::DescriptionCache;
use crate::service::fetcher::{DetailFetcher, FetchOutcome};
use crate::service::page_source::PageSource;

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub page_size: u32,
    pub fetch_concurrency: usize,
    pub source_name: String,
    pub page_delay: PolitenessDelay,
    pub card_delay: PolitenessDelay,
}

impl From<&HarvestSettings> for OrchestratorSettings {
    fn from(settings: &HarvestSettings) -> Self {
        Self {
            page_size: settings.site.page_size,
            fetch_concurrency: settings.fetch_concurrency.max(1),
            source_name: settings.site.source_name.clone(),
            page_delay: settings.page_delay,
            card_delay: settings.card_delay,
        }
    }
}

#[derive(Debug, Default)]
struct ListingStats {
    pages_requested: AtomicUsize,
    pages_failed: AtomicUsize,
    cards_seen: AtomicUsize,
    duplicates_skipped: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListingStatsSnapshot {
    pub pages_requested: usize,
    pub pages_failed: usize,
    pub cards_seen: usize,
    pub duplicates_skipped: usize,
}

pub struct ListingOrchestrator<P> {
    source: P,
    fetcher: DetailFetcher,
    settings: OrchestratorSettings,
    published_date: Option<NaiveDate>,
    stats: ListingStats,
}

impl<P: PageSource> ListingOrchestrator<P> {
    pub fn new(source: P, fetcher: DetailFetcher, settings: OrchestratorSettings) -> Self {
        Self {
            source,
            fetcher,
            settings,
            published_date: None,
            stats: ListingStats::default(),
        }
    }

    /// Pins the publication date stamped on records instead of using today.
    pub fn with_published_date(mut self, date: NaiveDate) -> Self {
        self.published_date = Some(date);
        self
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    pub fn fetcher(&self) -> &DetailFetcher {
        &self.fetcher
    }

    pub fn stats(&self) -> ListingStatsSnapshot {
        ListingStatsSnapshot {
            pages_requested: self.stats.pages_requested.load(Ordering::Relaxed),
            pages_failed: self.stats.pages_failed.load(Ordering::Relaxed),
            cards_seen: self.stats.cards_seen.load(Ordering::Relaxed),
            duplicates_skipped: self.stats.duplicates_skipped.load(Ordering::Relaxed),
        }
    }

    /// Walks pages `0..page_count` and returns one completed record per
    /// distinct card, in page order.
    ///
    /// Pages are visited sequentially; detail fetches within a page run up to
    /// `fetch_concurrency` at a time. Cancellation stops further pages.
    pub async fn run(
        &self,
        query: &str,
        location: &str,
        page_count: u32,
        auth: &AuthContext,
        cache: &DescriptionCache,
        cancel: &CancellationToken,
    ) -> Vec<JobRecord> {
        let published = self
            .published_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let mut records = Vec::new();
        let mut seen = HashSet::new();

        tracing::info!(
            "[LISTING] Searching {:?} in {:?} over {} pages",
            query,
            location,
            page_count
        );

        for page in 0..page_count {
            if cancel.is_cancelled() {
                tracing::warn!("[LISTING] Cancelled before page {}", page + 1);
                break;
            }

            let offset = page * self.settings.page_size;
            self.stats.pages_requested.fetch_add(1, Ordering::Relaxed);

            let markup = match self.source.get_page(query, location, offset).await {
                Ok(markup) => markup,
                Err(e) => {
                    self.stats.pages_failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("[LISTING] Page {} unavailable: {:#}", page + 1, e);
                    continue;
                }
            };

            let cards = self.source.parse_cards(&markup);
            self.stats.cards_seen.fetch_add(cards.len(), Ordering::Relaxed);
            if cards.is_empty() {
                tracing::info!("[LISTING] Page {}: no job cards", page + 1);
            }

            let mut pending = Vec::with_capacity(cards.len());
            for card in cards {
                let canonical = if card.link.is_empty() {
                    String::new()
                } else {
                    self.fetcher.normalizer().normalize(&card.link).into_value()
                };
                if !canonical.is_empty() && !seen.insert(canonical.clone()) {
                    tracing::debug!("[LISTING] Skipping duplicate card {}", canonical);
                    self.stats.duplicates_skipped.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
                pending.push(JobRecord::from_card(
                    card,
                    canonical,
                    &self.settings.source_name,
                    published,
                ));
            }

            let completed: Vec<JobRecord> = stream::iter(pending)
                .map(|job| self.complete_record(job, auth, cache, cancel))
                .buffered(self.settings.fetch_concurrency.max(1))
                .collect()
                .await;

            tracing::info!("[LISTING] Page {}: {} job records", page + 1, completed.len());
            records.extend(completed);

            if page + 1 < page_count {
                pause(self.settings.page_delay, cancel).await;
            }
        }

        tracing::info!("[LISTING] Found {} jobs total", records.len());
        records
    }

    async fn complete_record(
        &self,
        mut job: JobRecord,
        auth: &AuthContext,
        cache: &DescriptionCache,
        cancel: &CancellationToken,
    ) -> JobRecord {
        if job.link.trim().is_empty() {
            tracing::debug!("[LISTING] Card {:?} has no link", job.title);
            return job;
        }

        if !cache.contains(&job.canonical_link) {
            pause(self.settings.card_delay, cancel).await;
        }

        let outcome = self
            .fetcher
            .fetch_canonical(&job.canonical_link, auth, cache, cancel)
            .await;
        if let FetchOutcome::Exhausted { attempts } = &outcome {
            tracing::warn!(
                "[LISTING] {:?} kept without description after {} attempts",
                job.title,
                attempts
            );
        }
        job.full_description = outcome.into_text();
        job
    }
}

async fn pause(delay: PolitenessDelay, cancel: &CancellationToken) {
    tokio::select! {
        _ = delay.pause() => {}
        _ = cancel.cancelled() => {}
    }
}
